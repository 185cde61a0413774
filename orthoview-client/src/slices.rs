use std::io::Read;

use rayon::prelude::*;
use tracing::{debug, info};

use orthoview_core::{Plane, PlaneMap, RasterDims, VolumeDims};

use crate::error::ClientError;
use crate::Result;

/// One decoded slice raster, RGBA8 row-major.
#[derive(Debug, Clone)]
pub struct SliceImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Fetches raw encoded slice images by plane and stack index.
///
/// The production implementation talks HTTP; tests and offline mode swap in
/// in-memory fetchers.
pub trait SliceFetcher: Sync {
    fn fetch(
        &self,
        plane: Plane,
        index: u32,
    ) -> std::result::Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Fetches `{base}/{plane}/{index:03}.png` from the dataset's tile source.
pub struct HttpFetcher {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            agent: crate::http::agent(),
            base_url: base_url.into(),
        }
    }
}

impl SliceFetcher for HttpFetcher {
    fn fetch(
        &self,
        plane: Plane,
        index: u32,
    ) -> std::result::Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/{}/{index:03}.png", self.base_url, plane.wire_name());
        let resp = self.agent.get(&url).call()?;
        let mut bytes = Vec::new();
        resp.into_reader().read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

/// The decoded stacks for all three planes plus their raster dimensions.
///
/// Immutable once built: either every slice of every plane decoded, or the
/// load failed as a whole.
pub struct SliceStacks {
    pub stacks: PlaneMap<Vec<SliceImage>>,
    pub rasters: PlaneMap<RasterDims>,
}

impl SliceStacks {
    pub fn slice(&self, plane: Plane, index: u32) -> Option<&SliceImage> {
        self.stacks[plane].get(index as usize)
    }
}

/// Bulk-load every slice of every plane.
///
/// Fetches are issued concurrently across and within plane groups and
/// joined at the end; any single failure fails the entire load with the
/// offending plane and index, and nothing is retried. Each plane's raster
/// dimensions come from its first decoded image; later slices are assumed
/// identically sized.
pub fn load_stacks(fetcher: &(impl SliceFetcher + ?Sized), volume: VolumeDims) -> Result<SliceStacks> {
    let total: u32 = Plane::ALL.iter().map(|&p| volume.slice_count(p)).sum();
    info!(total, "loading slice stacks");

    let mut loaded: Vec<(Plane, Vec<SliceImage>)> = Plane::ALL
        .par_iter()
        .map(|&plane| Ok((plane, load_plane(fetcher, plane, volume.slice_count(plane))?)))
        .collect::<Result<_>>()?;

    let mut stacks: PlaneMap<Vec<SliceImage>> = PlaneMap::default();
    for (plane, stack) in loaded.drain(..) {
        stacks[plane] = stack;
    }

    let mut rasters = PlaneMap::<RasterDims>::from_fn(|_| RasterDims {
        width: 1,
        height: 1,
    });
    for plane in Plane::ALL {
        let first = &stacks[plane][0];
        rasters[plane] = RasterDims::new(first.width, first.height)?;
    }

    info!("slice stacks ready");
    Ok(SliceStacks { stacks, rasters })
}

fn load_plane(
    fetcher: &(impl SliceFetcher + ?Sized),
    plane: Plane,
    count: u32,
) -> Result<Vec<SliceImage>> {
    debug!(%plane, count, "loading plane stack");
    (0..count)
        .into_par_iter()
        .map(|index| {
            let bytes = fetcher
                .fetch(plane, index)
                .map_err(|source| ClientError::SliceLoad {
                    plane,
                    index,
                    source,
                })?;
            decode_slice(plane, index, &bytes)
        })
        .collect()
}

fn decode_slice(plane: Plane, index: u32, bytes: &[u8]) -> Result<SliceImage> {
    let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png).map_err(
        |e| ClientError::SliceLoad {
            plane,
            index,
            source: Box::new(e),
        },
    )?;
    let rgba = img.to_rgba8();
    Ok(SliceImage {
        width: rgba.width(),
        height: rgba.height(),
        pixels: rgba.into_raw(),
    })
}

/// Procedural stacks for offline mode and tests: a smooth gradient per
/// plane with a brightness ramp along the stack, voxel-for-voxel rasters.
pub fn synthetic_stacks(volume: VolumeDims) -> SliceStacks {
    let stacks = PlaneMap::from_fn(|plane| {
        let (h, v) = plane.axes();
        let (width, height) = (volume.axis_len(h), volume.axis_len(v));
        let count = volume.slice_count(plane);
        (0..count)
            .map(|index| {
                let depth = (index * 255 / count.max(1)) as u8;
                let mut pixels = Vec::with_capacity((width * height * 4) as usize);
                for py in 0..height {
                    for px in 0..width {
                        let r = (px * 255 / width) as u8;
                        let g = (py * 255 / height) as u8;
                        pixels.extend_from_slice(&[r, g, depth, 255]);
                    }
                }
                SliceImage {
                    width,
                    height,
                    pixels,
                }
            })
            .collect::<Vec<_>>()
    });
    let rasters = stacks.map(|_, stack| RasterDims {
        width: stack[0].width,
        height: stack[0].height,
    });
    SliceStacks { stacks, rasters }
}
