use std::time::Duration;

use orthoview_client::{
    AnnotationService, MemoryAnnotationStore, MemoryViewStore, SavedViewService,
};
use orthoview_core::{Annotation, Plane, PlaneMap, PlaneTransform, VolumeCursor};

/// A whole editing session against the in-memory stores: place two
/// annotations, move one, delete one, and round-trip a saved view.
#[test]
fn annotation_and_view_session() {
    let mut annotations =
        AnnotationService::new(MemoryAnnotationStore::new(), "ds-cortex", "ada")
            .with_retry_delay(Duration::ZERO);

    annotations.fetch_all().unwrap();
    assert!(annotations.annotations().is_empty());

    // Two placements on different planes.
    for (plane, slice, x, y, text) in [
        (Plane::Xy, 10, 100.0, 200.0, "soma"),
        (Plane::Yz, 3, 7.5, 8.25, "axon hillock"),
    ] {
        let id = annotations.next_id();
        let mut a = Annotation::pending(
            id,
            plane,
            slice,
            x,
            y,
            "ada".into(),
            "ds-cortex".into(),
            1_700_000_000_000,
        );
        a.text = text.into();
        annotations.upsert_local(a.clone());
        annotations.save(a, false).unwrap();
    }
    assert_eq!(annotations.annotations().len(), 2);
    assert!(annotations.annotations().iter().all(|a| a.is_persisted()));

    // Drag the first annotation to a new anchor: position-only update.
    let mut moved = annotations.annotations()[0].clone();
    moved.x = 150.0;
    moved.y = 250.0;
    annotations.save(moved.clone(), true).unwrap();
    annotations.fetch_all().unwrap();
    let found = annotations
        .annotations()
        .iter()
        .find(|a| a.text == "soma")
        .unwrap();
    assert_eq!((found.x, found.y), (150.0, 250.0));

    // Delete the second one; only the first survives a refetch.
    let doomed = annotations
        .annotations()
        .iter()
        .find(|a| a.text == "axon hillock")
        .unwrap()
        .id;
    annotations.delete(doomed).unwrap();
    annotations.fetch_all().unwrap();
    assert_eq!(annotations.annotations().len(), 1);
    assert_eq!(annotations.annotations()[0].text, "soma");

    // Save the camera, perturb it, then restore from the stored snapshot.
    let mut views = SavedViewService::new(MemoryViewStore::new(), "ada");
    let mut transforms = PlaneMap::<PlaneTransform>::default();
    transforms[Plane::Xy].zoom_by(1.05);
    transforms[Plane::Xy].pan_by(12.0, -3.0);
    let cursor = VolumeCursor { x: 40, y: 50, z: 10 };

    let id = views
        .save("soma close-up", cursor, &transforms, 1_700_000_000_500)
        .unwrap()
        .remote_id
        .clone()
        .unwrap();

    let restored = views.load(&id).unwrap();
    assert_eq!(restored.coords, cursor);
    let rt = restored.transforms();
    assert!((rt[Plane::Xy].zoom - transforms[Plane::Xy].zoom).abs() < 1e-12);
    assert_eq!(rt[Plane::Xy].pan, transforms[Plane::Xy].pan);
    assert_eq!(restored.load_count, 1);
    assert_eq!(restored.user_count("ada"), 1);
}
