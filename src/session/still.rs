use super::coordinator::SessionCoordinator;
use super::sink::{ExifOrientation, RawCapture};
use crate::camera::{CameraCapabilities, CaptureResult, OutputFormat, StillImage};
use crate::error::{CaptureError, RawcamError, Result, SessionError};
use crate::events::RawcamEvent;
use crate::focus::FocusTrigger;
use crate::params::CaptureParameters;
use crate::request::{build_capture_request, CaptureRequest, RequestContext, RequestPurpose};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tracing::{debug, error, info, warn};

/// Where a still ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Saved { path: PathBuf, format: OutputFormat },
    /// The naming policy declined the format
    Discarded { format: OutputFormat },
}

/// Still request: focus regions map with the camera's rotation orientation,
/// only the JPEG orientation carries the extra rotation
pub fn build_still_request(
    params: &CaptureParameters,
    trigger: Option<&FocusTrigger>,
    capabilities: &CameraCapabilities,
    rotation_orientation: u32,
    additional_rotation: Option<u32>,
) -> CaptureRequest {
    let ctx = RequestContext {
        capabilities,
        rotation_orientation,
    };
    let mut request = build_capture_request(params, trigger, RequestPurpose::Still, &ctx);
    request.jpeg_orientation = Some(jpeg_orientation(rotation_orientation, additional_rotation));
    request
}

/// JPEG orientation for a still: rotation orientation minus any extra rotation
pub fn jpeg_orientation(rotation_orientation: u32, additional_rotation: Option<u32>) -> u32 {
    let orientation = rotation_orientation % 360;
    match additional_rotation {
        Some(extra) => (orientation + 360 - extra % 360) % 360,
        None => orientation,
    }
}

impl SessionCoordinator {
    /// Take a still with the parameters current at the time of the call.
    ///
    /// `destination` overrides the naming policy. Stills are serialised; a
    /// second call waits for the first to finish.
    pub async fn capture(
        &self,
        destination: Option<PathBuf>,
        additional_rotation: Option<u32>,
    ) -> Result<CaptureOutcome> {
        let _guard = self.capture_lock.lock().await;

        match self.capture_inner(destination, additional_rotation).await {
            Ok(outcome) => {
                match &outcome {
                    CaptureOutcome::Saved { path, format } => {
                        self.event_bus.publish(RawcamEvent::CaptureCompleted {
                            path: path.clone(),
                            format: *format,
                        });
                    }
                    CaptureOutcome::Discarded { format } => {
                        debug!("No destination for {:?} still, discarded", format);
                    }
                }
                Ok(outcome)
            }
            Err(e) => {
                error!("Still capture failed: {}", e);
                self.event_bus.publish(RawcamEvent::CaptureFailed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn capture_inner(
        &self,
        destination: Option<PathBuf>,
        additional_rotation: Option<u32>,
    ) -> Result<CaptureOutcome> {
        if self.flash_required() && !self.latest_result().map_or(false, |r| r.is_3a_complete()) {
            self.run_precapture().await?;
        }

        let params = self.params.snapshot();
        let (session, reader, output, capabilities, rotation) = {
            let hw = self.hardware.lock().await;
            let (Some(active), Some(camera)) = (hw.session.as_ref(), hw.camera.as_ref()) else {
                return Err(SessionError::NotStreaming.into());
            };
            let (Some(reader), Some(output)) = (active.still_reader.clone(), active.output) else {
                return Err(CaptureError::ImageUnavailable.into());
            };
            (
                active.session.clone(),
                reader,
                output,
                camera.capabilities.clone(),
                hw.rotation_orientation,
            )
        };

        let orientation = jpeg_orientation(rotation, additional_rotation);
        let request =
            build_still_request(&params, None, &capabilities, rotation, additional_rotation);

        info!(
            "Capturing {:?} still at {}x{} (orientation {})",
            output.format, output.best_size.width, output.best_size.height, orientation
        );
        let (image, result): (StillImage, CaptureResult) = tokio::try_join!(
            async { reader.next_image().await.map_err(RawcamError::from) },
            async { session.capture(request).await.map_err(RawcamError::from) },
        )?;

        let path = match destination.or_else(|| (self.save_file)(SystemTime::now(), image.format))
        {
            Some(path) => path,
            None => return Ok(CaptureOutcome::Discarded { format: image.format }),
        };

        match image.format {
            OutputFormat::Jpeg | OutputFormat::Heic => {
                self.sink.write_encoded(&image.data, &path).await?;
            }
            OutputFormat::RawSensor => {
                if result.exposure_time_ns.is_none() || result.sensitivity.is_none() {
                    return Err(CaptureError::MissingMetadata.into());
                }
                let raw = RawCapture {
                    image: &image,
                    result: &result,
                    capabilities: &capabilities,
                    orientation: ExifOrientation::from_degrees(orientation),
                };
                self.sink.write_raw(raw, &path).await?;
            }
            OutputFormat::Yuv420 => {
                return Err(CaptureError::Failed {
                    details: "YUV stills are not written".to_string(),
                }
                .into());
            }
        }

        Ok(CaptureOutcome::Saved {
            path,
            format: image.format,
        })
    }

    /// Fire a full-frame focus/precapture trigger and wait for 3A to settle
    async fn run_precapture(&self) -> Result<()> {
        let mut results = self.subscribe_results();
        let trigger = self.request_focus_at(None);
        info!("Flash will fire, running precapture sequence");
        self.reconcile().await?;

        let timeout = Duration::from_millis(self.config.focus.precapture_timeout_ms);
        let settled = tokio::time::timeout(timeout, async {
            loop {
                let converged = results.borrow_and_update().as_ref().map_or(false, |r| {
                    r.tag.as_deref() == Some(trigger.tag.as_str()) && r.is_3a_complete()
                });
                if converged {
                    return true;
                }
                if results.changed().await.is_err() {
                    return false;
                }
            }
        })
        .await;

        match settled {
            Ok(true) => debug!("Precapture converged"),
            Ok(false) => warn!("Result stream closed during precapture"),
            Err(_) => warn!(
                "3A did not converge within {} ms, capturing anyway",
                self.config.focus.precapture_timeout_ms
            ),
        }
        Ok(())
    }
}
