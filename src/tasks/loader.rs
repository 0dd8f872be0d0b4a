use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use fast_image_resize as fir;
use image::RgbaImage;
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::events::{DecodeRequest, DecodedImage, LoaderEvent, Variant};

// Decodes an image to RGBA8 and applies EXIF orientation if available.
fn decode_rgba8_apply_exif(path: &Path) -> Result<RgbaImage> {
    let img = image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()?;
    let mut img = img.to_rgba8();

    let orientation: u16 = read_orientation(path).unwrap_or(1);
    match orientation {
        2 => img = image::imageops::flip_horizontal(&img),
        3 => img = image::imageops::rotate180(&img),
        4 => img = image::imageops::flip_vertical(&img),
        5 => {
            img = image::imageops::rotate90(&img);
            img = image::imageops::flip_horizontal(&img);
        }
        6 => img = image::imageops::rotate90(&img),
        7 => {
            img = image::imageops::rotate270(&img);
            img = image::imageops::flip_horizontal(&img);
        }
        8 => img = image::imageops::rotate270(&img),
        _ => {}
    }

    Ok(img)
}

fn read_orientation(path: &Path) -> Option<u16> {
    let file = File::open(path).ok()?;
    let mut buf = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut buf).ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    let o = field.value.get_uint(0)? as u16;
    debug!("exif orientation {} for {}", o, path.display());
    Some(o)
}

/// Size that fits `(width, height)` inside a `max_dim` square, preserving
/// aspect ratio. Never upscales.
pub fn fit_within(width: u32, height: u32, max_dim: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_dim || longest == 0 {
        return (width, height);
    }
    let scale = max_dim as f64 / longest as f64;
    let w = ((width as f64 * scale).round() as u32).max(1);
    let h = ((height as f64 * scale).round() as u32).max(1);
    (w, h)
}

fn resize_rgba(source: &RgbaImage, target_w: u32, target_h: u32) -> Result<RgbaImage> {
    if source.width() == target_w && source.height() == target_h {
        return Ok(source.clone());
    }
    let src_view = fir::images::ImageRef::new(
        source.width(),
        source.height(),
        source.as_raw(),
        fir::PixelType::U8x4,
    )
    .context("failed to create source view for resize")?;
    let mut dst_image = fir::images::Image::new(target_w, target_h, fir::PixelType::U8x4);
    let options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::CatmullRom));
    let mut resizer = fir::Resizer::new();
    resizer
        .resize(&src_view, &mut dst_image, Some(&options))
        .context("resize failed")?;
    RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
        .context("failed to construct resized RGBA image")
}

fn decode_request(req: &DecodeRequest) -> Result<DecodedImage> {
    let img = decode_rgba8_apply_exif(&req.path)
        .with_context(|| format!("failed to decode {}", req.path.display()))?;
    let max_dim = match req.variant {
        Variant::Thumbnail(dim) | Variant::Full(dim) => dim,
    };
    let (w, h) = fit_within(img.width(), img.height(), max_dim);
    let img = resize_rgba(&img, w, h)?;
    Ok(DecodedImage {
        ordinal: req.ordinal,
        variant: req.variant,
        width: w,
        height: h,
        pixels: img.into_raw(),
    })
}

/// Decodes requested images off the async threads, at most `max_in_flight`
/// at a time. Duplicate requests for an image that is already decoding are
/// dropped.
pub async fn run(
    mut requests: Receiver<DecodeRequest>,
    to_viewer: Sender<LoaderEvent>,
    cancel: CancellationToken,
    max_in_flight: usize,
) -> Result<()> {
    let mut in_flight: HashSet<(usize, Variant)> = HashSet::new();
    let mut tasks: JoinSet<(DecodeRequest, Option<DecodedImage>)> = JoinSet::new();

    loop {
        select! {
            _ = cancel.cancelled() => break,

            Some(req) = requests.recv(), if in_flight.len() < max_in_flight => {
                if in_flight.insert((req.ordinal, req.variant)) {
                    tasks.spawn(async move {
                        let job = req.clone();
                        let res = tokio::task::spawn_blocking(move || decode_request(&job)).await;
                        let decoded = match res {
                            Ok(Ok(decoded)) => Some(decoded),
                            Ok(Err(err)) => {
                                warn!(error = ?err, "image decode failed");
                                None
                            }
                            Err(err) => {
                                warn!(error = %err, "decode worker panicked");
                                None
                            }
                        };
                        (req, decoded)
                    });
                } else {
                    debug!(ordinal = req.ordinal, variant = ?req.variant, "decode already in flight");
                }
            }

            Some(join_res) = tasks.join_next() => {
                let Ok((req, decoded)) = join_res else {
                    continue;
                };
                in_flight.remove(&(req.ordinal, req.variant));
                let event = match decoded {
                    Some(image) => {
                        debug!(ordinal = image.ordinal, width = image.width, height = image.height, "decoded");
                        LoaderEvent::Decoded(image)
                    }
                    None => LoaderEvent::Failed {
                        ordinal: req.ordinal,
                        variant: req.variant,
                    },
                };
                if to_viewer.send(event).await.is_err() {
                    break;
                }
            }

            else => break,
        }
    }
    Ok(())
}
