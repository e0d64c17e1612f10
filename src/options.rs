use std::path::{Path, PathBuf};

use crate::{
    command::EncoderSettings,
    error::{SlidereelError, SlidereelResult},
    model::{Segment, Timeline, Transition},
};

/// Looping mode for one media kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    Never,
    Auto,
}

/// How many base images must fit into a partial loop for one to be created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageLoopThreshold {
    All,
    #[serde(untagged)]
    Count(u32),
}

/// Milliseconds of audio that must fit into a loop for one to be created.
///
/// Carried for configuration parity; the calculator does not consult it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioLoopThreshold {
    All,
    #[serde(untagged)]
    Millis(u64),
}

/// Tolerance by which one stream may outrun the other before looping is
/// considered. `Auto` resolves to the last segment's duration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndOfInputThreshold {
    Auto,
    #[serde(untagged)]
    Millis(u64),
}

/// Fully-resolved looping configuration consumed by the calculator.
///
/// Every field carries a concrete value; defaulting happens in
/// [`SlideshowOptions::resolve`] before the core ever sees it.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LoopPolicy {
    pub loop_images: LoopMode,
    pub loop_audio: LoopMode,
    pub image_loop_threshold: ImageLoopThreshold,
    pub audio_loop_threshold: AudioLoopThreshold,
    pub end_of_input_threshold: EndOfInputThreshold,
    /// Transition used only for the seam between one full image loop and the
    /// start of the next.
    pub loop_transition: Transition,
    pub loop_transition_duration_ms: u64,
}

impl LoopPolicy {
    pub fn validate(&self) -> SlidereelResult<()> {
        if let ImageLoopThreshold::Count(0) = self.image_loop_threshold {
            return Err(SlidereelError::validation(
                "image_loop_threshold count must be > 0",
            ));
        }
        if self.loop_transition.is_none() && self.loop_transition_duration_ms != 0 {
            return Err(SlidereelError::validation(
                "loop_transition of none must have loop_transition_duration_ms = 0",
            ));
        }
        Ok(())
    }
}

/// One input image as the caller describes it. Unset fields fall back to the
/// option defaults during [`SlideshowOptions::resolve`].
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ManifestImage {
    pub path: PathBuf,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub transition: Option<Transition>,
    #[serde(default)]
    pub transition_duration_ms: Option<u64>,
}

impl ManifestImage {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            duration_ms: None,
            transition: None,
            transition_duration_ms: None,
        }
    }
}

/// Requested canvas dimensions. A single set axis scales the other
/// proportionally from the largest input image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ResizeRequest {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ImageOptions {
    pub image_duration_ms: Option<u64>,
    pub last_image_extra_duration_ms: Option<u64>,
    pub resize: Option<ResizeRequest>,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LoopingOptions {
    pub loop_images: Option<LoopMode>,
    pub loop_audio: Option<LoopMode>,
    pub image_loop_threshold: Option<ImageLoopThreshold>,
    pub audio_loop_threshold: Option<AudioLoopThreshold>,
    pub end_of_input_threshold: Option<EndOfInputThreshold>,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TransitionOptions {
    pub use_transitions: Option<bool>,
    pub image_transition: Option<Transition>,
    pub loop_transition: Option<Transition>,
    pub transition_duration_ms: Option<u64>,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    pub container: Option<String>,
    pub fps: Option<u32>,
    pub pixel_format: Option<String>,
    pub video_codec: Option<String>,
    pub x264_preset: Option<String>,
    pub video_bitrate: Option<String>,
    pub audio_codec: Option<String>,
    pub audio_bitrate: Option<String>,
    pub stream_copy_audio: Option<bool>,
    pub custom_output_args: Option<String>,
}

/// Caller-facing options. Every field is optional; [`Self::resolve`] fills
/// the defaults so downstream code never branches on presence.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SlideshowOptions {
    pub image: ImageOptions,
    pub looping: LoopingOptions,
    pub transition: TransitionOptions,
    pub output: OutputOptions,
}

/// Resolved image-stage defaults.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ImageDefaults {
    pub image_duration_ms: u64,
    pub last_image_extra_duration_ms: u64,
    pub resize: ResizeRequest,
}

/// Everything downstream of the defaulting step works from this.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ResolvedOptions {
    pub image: ImageDefaults,
    pub use_transitions: bool,
    pub image_transition: Transition,
    pub transition_duration_ms: u64,
    pub policy: LoopPolicy,
    pub encoder: EncoderSettings,
}

impl SlideshowOptions {
    /// Fill every unset field with its default, producing the single resolved
    /// configuration the core operates on.
    pub fn resolve(&self) -> ResolvedOptions {
        let use_transitions = self.transition.use_transitions.unwrap_or(true);
        let transition_duration_ms = self.transition.transition_duration_ms.unwrap_or(250);

        // The seam transition only exists while transitions are in play.
        let (loop_transition, loop_transition_duration_ms) = if use_transitions {
            (
                self.transition.loop_transition.unwrap_or(Transition::Pixelize),
                transition_duration_ms,
            )
        } else {
            (Transition::None, 0)
        };

        ResolvedOptions {
            image: ImageDefaults {
                image_duration_ms: self.image.image_duration_ms.unwrap_or(3000),
                last_image_extra_duration_ms: self.image.last_image_extra_duration_ms.unwrap_or(0),
                resize: self.image.resize.unwrap_or_default(),
            },
            use_transitions,
            image_transition: self
                .transition
                .image_transition
                .unwrap_or(Transition::SlideLeft),
            transition_duration_ms,
            policy: LoopPolicy {
                loop_images: self.looping.loop_images.unwrap_or(LoopMode::Never),
                loop_audio: self.looping.loop_audio.unwrap_or(LoopMode::Auto),
                image_loop_threshold: self
                    .looping
                    .image_loop_threshold
                    .unwrap_or(ImageLoopThreshold::All),
                audio_loop_threshold: self
                    .looping
                    .audio_loop_threshold
                    .unwrap_or(AudioLoopThreshold::Millis(0)),
                end_of_input_threshold: self
                    .looping
                    .end_of_input_threshold
                    .unwrap_or(EndOfInputThreshold::Auto),
                loop_transition,
                loop_transition_duration_ms,
            },
            encoder: EncoderSettings {
                container: self.output.container.clone().unwrap_or_else(|| "mp4".into()),
                fps: self.output.fps,
                pixel_format: self
                    .output
                    .pixel_format
                    .clone()
                    .unwrap_or_else(|| "yuv420p".into()),
                video_codec: self
                    .output
                    .video_codec
                    .clone()
                    .unwrap_or_else(|| "libx264".into()),
                x264_preset: self
                    .output
                    .x264_preset
                    .clone()
                    .unwrap_or_else(|| "superfast".into()),
                video_bitrate: self.output.video_bitrate.clone(),
                audio_codec: self.output.audio_codec.clone(),
                audio_bitrate: self.output.audio_bitrate.clone(),
                stream_copy_audio: self.output.stream_copy_audio.unwrap_or(false),
                custom_output_args: self.output.custom_output_args.clone(),
            },
        }
    }
}

impl ResolvedOptions {
    /// Fold the manifest entries and prepared (canvas-normalized) files into
    /// the base timeline: per-image overrides win over defaults, the last
    /// segment is forced to a hard cut, and disabling transitions strips
    /// every seam.
    pub fn base_timeline(&self, images: &[ManifestImage], prepared: &[&Path]) -> Timeline {
        debug_assert_eq!(images.len(), prepared.len());

        let mut segments: Vec<Segment> = images
            .iter()
            .zip(prepared)
            .map(|(image, path)| {
                let transition = image.transition.unwrap_or(self.image_transition);
                let transition_duration_ms = if transition.is_none() {
                    0
                } else {
                    image
                        .transition_duration_ms
                        .unwrap_or(self.transition_duration_ms)
                };
                Segment {
                    source: path.to_path_buf(),
                    duration_ms: image.duration_ms.unwrap_or(self.image.image_duration_ms),
                    transition,
                    transition_duration_ms,
                }
            })
            .collect();

        if let Some(last) = segments.last_mut() {
            last.transition = Transition::None;
            last.transition_duration_ms = 0;
            last.duration_ms += self.image.last_image_extra_duration_ms;
        }

        if !self.use_transitions {
            for segment in &mut segments {
                segment.transition = Transition::None;
                segment.transition_duration_ms = 0;
            }
        }

        Timeline::new(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_fills_documented_defaults() {
        let resolved = SlideshowOptions::default().resolve();
        assert_eq!(resolved.image.image_duration_ms, 3000);
        assert_eq!(resolved.image_transition, Transition::SlideLeft);
        assert_eq!(resolved.transition_duration_ms, 250);
        assert_eq!(resolved.policy.loop_images, LoopMode::Never);
        assert_eq!(resolved.policy.loop_audio, LoopMode::Auto);
        assert_eq!(resolved.policy.image_loop_threshold, ImageLoopThreshold::All);
        assert_eq!(
            resolved.policy.end_of_input_threshold,
            EndOfInputThreshold::Auto
        );
        assert_eq!(resolved.policy.loop_transition, Transition::Pixelize);
        assert_eq!(resolved.policy.loop_transition_duration_ms, 250);
        assert_eq!(resolved.encoder.container, "mp4");
        assert_eq!(resolved.encoder.video_codec, "libx264");
    }

    #[test]
    fn disabling_transitions_clears_the_seam() {
        let options = SlideshowOptions {
            transition: TransitionOptions {
                use_transitions: Some(false),
                ..Default::default()
            },
            ..Default::default()
        };
        let resolved = options.resolve();
        assert_eq!(resolved.policy.loop_transition, Transition::None);
        assert_eq!(resolved.policy.loop_transition_duration_ms, 0);
    }

    #[test]
    fn threshold_serde_accepts_keyword_or_number() {
        let all: ImageLoopThreshold = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(all, ImageLoopThreshold::All);
        let count: ImageLoopThreshold = serde_json::from_str("2").unwrap();
        assert_eq!(count, ImageLoopThreshold::Count(2));

        let auto: EndOfInputThreshold = serde_json::from_str("\"auto\"").unwrap();
        assert_eq!(auto, EndOfInputThreshold::Auto);
        let fixed: EndOfInputThreshold = serde_json::from_str("1500").unwrap();
        assert_eq!(fixed, EndOfInputThreshold::Millis(1500));
    }

    #[test]
    fn base_timeline_applies_overrides_and_forces_last_cut() {
        let options = SlideshowOptions::default().resolve();
        let images = vec![
            ManifestImage {
                duration_ms: Some(5000),
                transition: Some(Transition::Fade),
                transition_duration_ms: Some(400),
                ..ManifestImage::from_path("a.png")
            },
            ManifestImage::from_path("b.png"),
            ManifestImage {
                transition: Some(Transition::Dissolve),
                ..ManifestImage::from_path("c.png")
            },
        ];
        let prepared = [Path::new("t/1.png"), Path::new("t/2.png"), Path::new("t/3.png")];
        let timeline = options.base_timeline(&images, &prepared);

        let segs = timeline.segments();
        assert_eq!(segs[0].duration_ms, 5000);
        assert_eq!(segs[0].transition, Transition::Fade);
        assert_eq!(segs[0].transition_duration_ms, 400);
        assert_eq!(segs[1].duration_ms, 3000);
        assert_eq!(segs[1].transition, Transition::SlideLeft);
        assert_eq!(segs[2].transition, Transition::None);
        assert_eq!(segs[2].transition_duration_ms, 0);
        assert_eq!(segs[0].source, Path::new("t/1.png"));
    }

    #[test]
    fn base_timeline_adds_last_image_extra_duration() {
        let options = SlideshowOptions {
            image: ImageOptions {
                last_image_extra_duration_ms: Some(1200),
                ..Default::default()
            },
            ..Default::default()
        };
        let resolved = options.resolve();
        let images = vec![
            ManifestImage::from_path("a.png"),
            ManifestImage::from_path("b.png"),
        ];
        let prepared = [Path::new("1.png"), Path::new("2.png")];
        let timeline = resolved.base_timeline(&images, &prepared);
        assert_eq!(timeline.segments()[1].duration_ms, 4200);
    }

    #[test]
    fn explicit_none_transition_zeroes_its_duration() {
        let options = SlideshowOptions::default().resolve();
        let images = vec![
            ManifestImage {
                transition: Some(Transition::None),
                ..ManifestImage::from_path("a.png")
            },
            ManifestImage::from_path("b.png"),
        ];
        let prepared = [Path::new("1.png"), Path::new("2.png")];
        let timeline = options.base_timeline(&images, &prepared);
        assert_eq!(timeline.segments()[0].transition_duration_ms, 0);
        assert!(timeline.validate().is_ok());
    }

    #[test]
    fn base_timeline_without_transitions_is_all_cuts() {
        let options = SlideshowOptions {
            transition: TransitionOptions {
                use_transitions: Some(false),
                ..Default::default()
            },
            ..Default::default()
        };
        let resolved = options.resolve();
        let images = vec![
            ManifestImage::from_path("a.png"),
            ManifestImage::from_path("b.png"),
        ];
        let prepared = [Path::new("1.png"), Path::new("2.png")];
        let timeline = resolved.base_timeline(&images, &prepared);
        assert!(timeline.segments().iter().all(|s| s.transition.is_none()));
    }

    #[test]
    fn policy_validate_rejects_zero_count_threshold() {
        let mut resolved = SlideshowOptions::default().resolve();
        resolved.policy.image_loop_threshold = ImageLoopThreshold::Count(0);
        assert!(resolved.policy.validate().is_err());
    }
}
