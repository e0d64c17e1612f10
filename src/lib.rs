//! Slidereel turns an ordered set of still images and an optional audio track
//! into a single video, inferring loop counts and transition timings
//! automatically.
//!
//! The interesting part is pure computation:
//!
//! - [`compute_timeline`] decides how many times images and audio repeat
//! - [`compile_filter_graph`] turns the expanded timeline into an ordered
//!   chain of crossfade/concat nodes
//! - [`assemble_command`] turns plan + graph into the ffmpeg argument list
//!
//! [`create_slideshow`] wires those together with the external collaborators
//! (canvas normalization, ffprobe, ffmpeg).
#![forbid(unsafe_code)]

pub mod canvas;
pub mod command;
pub mod encode;
pub mod error;
pub mod filtergraph;
pub mod looping;
pub mod model;
pub mod options;
pub mod probe;
pub mod slideshow;

pub use command::{AssembledCommand, AudioTrack, EncoderSettings, OutputLayout, assemble_command};
pub use error::{SlidereelError, SlidereelResult};
pub use filtergraph::{FilterGraph, FilterNode, Label, compile_filter_graph};
pub use looping::{LoopPlan, compute_timeline};
pub use model::{Segment, Timeline, Transition};
pub use options::{
    AudioLoopThreshold, EndOfInputThreshold, ImageLoopThreshold, LoopMode, LoopPolicy,
    ManifestImage, ResizeRequest, ResolvedOptions, SlideshowOptions,
};
pub use slideshow::{SlideshowOutput, SlideshowPlan, create_slideshow, plan_slideshow};
