use tracing::{error, info};

use crate::app::OrthoViewApp;

impl OrthoViewApp {
    /// Write the focused plane's current slice to a PNG picked by the user.
    pub(crate) fn export_current_slice(&self) {
        let plane = self.focused_plane;
        let index = self.cursor.slice_index(plane);
        let Some(stacks) = self.stacks.as_ref() else {
            return;
        };
        let Some(slice) = stacks.slice(plane, index) else {
            return;
        };

        let suggested = format!("{}_{index:03}.png", plane.wire_name());
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(suggested)
            .add_filter("PNG image", &["png"])
            .save_file()
        else {
            return;
        };

        let Some(image) =
            image::RgbaImage::from_raw(slice.width, slice.height, slice.pixels.clone())
        else {
            error!("slice buffer size mismatch during export");
            return;
        };
        match image.save_with_format(&path, image::ImageFormat::Png) {
            Ok(()) => info!(
                "exported {} slice {index:03} to {}",
                plane.label(),
                path.display()
            ),
            Err(e) => error!("failed to export slice: {e}"),
        }
    }
}
