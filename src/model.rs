use std::path::PathBuf;

use crate::error::{SlidereelError, SlidereelResult};

/// Transition effect between two adjacent segments.
///
/// The set mirrors ffmpeg's `xfade` transition names; [`Transition::None`]
/// means a hard cut (plain concatenation).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    None,
    Fade,
    WipeLeft,
    WipeRight,
    WipeUp,
    WipeDown,
    SlideLeft,
    SlideRight,
    SlideUp,
    SlideDown,
    CircleCrop,
    RectCrop,
    Distance,
    FadeBlack,
    FadeWhite,
    Radial,
    SmoothLeft,
    SmoothRight,
    SmoothUp,
    SmoothDown,
    CircleOpen,
    CircleClose,
    VertOpen,
    VertClose,
    HorzOpen,
    HorzClose,
    Dissolve,
    Pixelize,
    DiagTl,
    DiagTr,
    DiagBl,
    DiagBr,
    HlSlice,
    HrSlice,
    VuSlice,
    VdSlice,
    HBlur,
    FadeGrays,
    WipeTl,
    WipeTr,
    WipeBl,
    WipeBr,
    SqueezeH,
    SqueezeV,
    ZoomIn,
    FadeFast,
    FadeSlow,
    HlWind,
    HrWind,
    VuWind,
    VdWind,
}

impl Transition {
    pub fn is_none(self) -> bool {
        self == Transition::None
    }

    /// The token ffmpeg's `xfade` filter expects.
    pub fn name(self) -> &'static str {
        match self {
            Transition::None => "none",
            Transition::Fade => "fade",
            Transition::WipeLeft => "wipeleft",
            Transition::WipeRight => "wiperight",
            Transition::WipeUp => "wipeup",
            Transition::WipeDown => "wipedown",
            Transition::SlideLeft => "slideleft",
            Transition::SlideRight => "slideright",
            Transition::SlideUp => "slideup",
            Transition::SlideDown => "slidedown",
            Transition::CircleCrop => "circlecrop",
            Transition::RectCrop => "rectcrop",
            Transition::Distance => "distance",
            Transition::FadeBlack => "fadeblack",
            Transition::FadeWhite => "fadewhite",
            Transition::Radial => "radial",
            Transition::SmoothLeft => "smoothleft",
            Transition::SmoothRight => "smoothright",
            Transition::SmoothUp => "smoothup",
            Transition::SmoothDown => "smoothdown",
            Transition::CircleOpen => "circleopen",
            Transition::CircleClose => "circleclose",
            Transition::VertOpen => "vertopen",
            Transition::VertClose => "vertclose",
            Transition::HorzOpen => "horzopen",
            Transition::HorzClose => "horzclose",
            Transition::Dissolve => "dissolve",
            Transition::Pixelize => "pixelize",
            Transition::DiagTl => "diagtl",
            Transition::DiagTr => "diagtr",
            Transition::DiagBl => "diagbl",
            Transition::DiagBr => "diagbr",
            Transition::HlSlice => "hlslice",
            Transition::HrSlice => "hrslice",
            Transition::VuSlice => "vuslice",
            Transition::VdSlice => "vdslice",
            Transition::HBlur => "hblur",
            Transition::FadeGrays => "fadegrays",
            Transition::WipeTl => "wipetl",
            Transition::WipeTr => "wipetr",
            Transition::WipeBl => "wipebl",
            Transition::WipeBr => "wipebr",
            Transition::SqueezeH => "squeezeh",
            Transition::SqueezeV => "squeezev",
            Transition::ZoomIn => "zoomin",
            Transition::FadeFast => "fadefast",
            Transition::FadeSlow => "fadeslow",
            Transition::HlWind => "hlwind",
            Transition::HrWind => "hrwind",
            Transition::VuWind => "vuwind",
            Transition::VdWind => "vdwind",
        }
    }
}

/// One image's role in the timeline: how long it is shown and how it hands
/// over to the next segment.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Segment {
    /// Image file backing this segment (already normalized to the canvas).
    pub source: PathBuf,
    /// Milliseconds the image is shown, excluding any transition.
    pub duration_ms: u64,
    /// Outgoing transition into the *next* segment.
    pub transition: Transition,
    /// Crossfade duration into the next segment, milliseconds.
    pub transition_duration_ms: u64,
}

impl Segment {
    pub fn validate(&self) -> SlidereelResult<()> {
        if self.duration_ms == 0 {
            return Err(SlidereelError::validation(
                "segment duration_ms must be > 0",
            ));
        }
        if self.transition.is_none() && self.transition_duration_ms != 0 {
            return Err(SlidereelError::validation(
                "segment without a transition must have transition_duration_ms = 0",
            ));
        }
        Ok(())
    }

    /// Milliseconds this segment contributes to the timeline total.
    pub fn span_ms(&self) -> u64 {
        self.duration_ms + self.transition_duration_ms
    }
}

/// Ordered sequence of [`Segment`]s; order is playback order.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Timeline(Vec<Segment>);

impl Timeline {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total playback duration: sum of `duration + transition_duration` over
    /// all segments.
    pub fn total_duration_ms(&self) -> u64 {
        self.0.iter().map(Segment::span_ms).sum()
    }

    pub fn validate(&self) -> SlidereelResult<()> {
        if self.0.is_empty() {
            return Err(SlidereelError::validation("timeline has no segments"));
        }
        for segment in &self.0 {
            segment.validate()?;
        }
        Ok(())
    }

    /// Force the last segment to a hard cut. Nothing follows it, so an
    /// outgoing transition would dangle.
    pub fn finalized(mut self) -> Self {
        if let Some(last) = self.0.last_mut() {
            last.transition = Transition::None;
            last.transition_duration_ms = 0;
        }
        self
    }
}

impl From<Vec<Segment>> for Timeline {
    fn from(segments: Vec<Segment>) -> Self {
        Self::new(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(duration_ms: u64, transition: Transition, transition_duration_ms: u64) -> Segment {
        Segment {
            source: PathBuf::from("img.png"),
            duration_ms,
            transition,
            transition_duration_ms,
        }
    }

    #[test]
    fn total_duration_sums_durations_and_transitions() {
        let timeline = Timeline::new(vec![
            seg(3500, Transition::Fade, 500),
            seg(4000, Transition::Dissolve, 300),
            seg(3500, Transition::None, 0),
        ]);
        assert_eq!(timeline.total_duration_ms(), 11800);
    }

    #[test]
    fn validate_rejects_empty_timeline() {
        assert!(Timeline::new(vec![]).validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_duration() {
        let timeline = Timeline::new(vec![seg(0, Transition::None, 0)]);
        assert!(timeline.validate().is_err());
    }

    #[test]
    fn validate_rejects_dangling_transition_duration() {
        let timeline = Timeline::new(vec![seg(1000, Transition::None, 250)]);
        assert!(timeline.validate().is_err());
    }

    #[test]
    fn finalized_clears_last_transition() {
        let timeline = Timeline::new(vec![
            seg(1000, Transition::Fade, 250),
            seg(1000, Transition::Pixelize, 250),
        ])
        .finalized();
        let last = timeline.segments().last().unwrap();
        assert_eq!(last.transition, Transition::None);
        assert_eq!(last.transition_duration_ms, 0);
    }

    #[test]
    fn transition_serde_uses_ffmpeg_tokens() {
        let json = serde_json::to_string(&Transition::SlideLeft).unwrap();
        assert_eq!(json, "\"slideleft\"");
        let back: Transition = serde_json::from_str("\"pixelize\"").unwrap();
        assert_eq!(back, Transition::Pixelize);
        assert_eq!(Transition::WipeTl.name(), "wipetl");
    }
}
