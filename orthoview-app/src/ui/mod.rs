pub(crate) mod annotations;
pub(crate) mod toolbar;
pub(crate) mod views;
