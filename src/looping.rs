use crate::{
    error::{SlidereelError, SlidereelResult},
    model::{Segment, Timeline},
    options::{EndOfInputThreshold, ImageLoopThreshold, LoopMode, LoopPolicy},
};

/// Output of the loop calculator: the expanded image timeline and how many
/// times the audio track plays.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LoopPlan {
    pub timeline: Timeline,
    pub audio_loop_count: u32,
}

/// Decide how many times images and audio repeat so both streams roughly
/// coincide within the policy's tolerances.
///
/// Pure: same inputs, same plan. `audio_duration_ms` of 0 means no audio.
#[tracing::instrument(skip(base, policy))]
pub fn compute_timeline(
    base: &Timeline,
    audio_duration_ms: u64,
    policy: &LoopPolicy,
) -> SlidereelResult<LoopPlan> {
    base.validate()?;
    policy.validate()?;

    let Some(last) = base.segments().last() else {
        return Err(SlidereelError::validation("timeline has no segments"));
    };
    if !last.transition.is_none() {
        return Err(SlidereelError::validation(
            "base timeline's last segment must not carry a transition",
        ));
    }

    let end_threshold_ms = match policy.end_of_input_threshold {
        EndOfInputThreshold::Auto => last.duration_ms,
        EndOfInputThreshold::Millis(ms) => ms,
    };

    let total_ms = base.total_duration_ms();

    let timeline = if policy.loop_images == LoopMode::Never
        || total_ms + end_threshold_ms >= audio_duration_ms
    {
        base.clone().finalized()
    } else {
        expand_images(base, audio_duration_ms, end_threshold_ms, policy)
    };

    let audio_loop_count = audio_loop_count(
        timeline.total_duration_ms(),
        audio_duration_ms,
        end_threshold_ms,
        policy.loop_audio,
    );

    Ok(LoopPlan {
        timeline,
        audio_loop_count,
    })
}

/// Repeat the base timeline enough whole times, plus an optional greedy
/// partial prefix, to cover the audio within the end-of-input tolerance.
fn expand_images(
    base: &Timeline,
    audio_duration_ms: u64,
    end_threshold_ms: u64,
    policy: &LoopPolicy,
) -> Timeline {
    let total_ms = base.total_duration_ms();
    let leftover_ms = audio_duration_ms + end_threshold_ms - total_ms;
    let single_loop_span_ms = total_ms + policy.loop_transition_duration_ms;

    // A zero span would make the loop-count division undefined; treat it as
    // "no looping possible" rather than a crash.
    if single_loop_span_ms == 0 {
        return base.clone().finalized();
    }

    let full_loop_count = leftover_ms / single_loop_span_ms;
    let remainder_ms = leftover_ms % single_loop_span_ms;

    let partial = partial_loop(base, remainder_ms, policy.image_loop_threshold);

    if full_loop_count == 0 && partial.is_empty() {
        return base.clone().finalized();
    }

    // Every full copy ends in the seam transition into the copy that follows;
    // the trailing finalization undoes it on whichever segment ends up last.
    let mut seamed = base.segments().to_vec();
    if let Some(last) = seamed.last_mut() {
        last.transition = policy.loop_transition;
        last.transition_duration_ms = policy.loop_transition_duration_ms;
    }

    let copies = 1 + full_loop_count as usize;
    let mut segments = Vec::with_capacity(seamed.len() * copies + partial.len());
    for _ in 0..copies {
        segments.extend_from_slice(&seamed);
    }
    segments.extend(partial);

    Timeline::new(segments).finalized()
}

/// Greedily pack base segments into the remaining budget, gated by the image
/// loop threshold. A segment is accepted while its duration is strictly below
/// the remaining budget; the budget then shrinks by its full span.
fn partial_loop(base: &Timeline, budget_ms: u64, threshold: ImageLoopThreshold) -> Vec<Segment> {
    let packed = pack_greedy(base, budget_ms);
    match threshold {
        ImageLoopThreshold::All => {
            if packed.len() == base.len() {
                packed
            } else {
                Vec::new()
            }
        }
        ImageLoopThreshold::Count(count) => {
            if (count as usize) <= base.len() {
                packed
            } else {
                Vec::new()
            }
        }
    }
}

fn pack_greedy(base: &Timeline, mut budget_ms: u64) -> Vec<Segment> {
    let mut packed = Vec::new();
    for segment in base.segments() {
        if segment.duration_ms >= budget_ms {
            break;
        }
        budget_ms = budget_ms.saturating_sub(segment.span_ms());
        packed.push(segment.clone());
    }
    packed
}

fn audio_loop_count(
    final_image_duration_ms: u64,
    audio_duration_ms: u64,
    end_threshold_ms: u64,
    mode: LoopMode,
) -> u32 {
    if mode == LoopMode::Never
        || audio_duration_ms == 0
        || audio_duration_ms + end_threshold_ms >= final_image_duration_ms
    {
        return 1;
    }
    (final_image_duration_ms + end_threshold_ms).div_ceil(audio_duration_ms) as u32
}
