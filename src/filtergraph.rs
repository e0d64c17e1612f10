use std::fmt;

use crate::{
    error::SlidereelResult,
    model::{Timeline, Transition},
};

/// Position-keyed label in the compiled graph.
///
/// Labels are generated, never parsed; keeping them as an enum instead of
/// formatted strings keeps the index arithmetic in one place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Label {
    /// Raw demuxer input, 0-based.
    Input(usize),
    /// Time-base-normalized image stream, 1-based.
    Image(usize),
    /// Intermediate fold output, 1-based.
    Filter(usize),
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Input(i) => write!(f, "{i}"),
            Label::Image(i) => write!(f, "img{i}"),
            Label::Filter(i) => write!(f, "filter{i}"),
        }
    }
}

/// One operation in the compiled filter graph.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FilterNode {
    /// Map a raw input onto the common time base so crossfade offsets are
    /// meaningful across inputs.
    NormalizeTimebase { input: Label, output: Label },
    /// Blend two streams over `duration_ms` starting at `offset_ms`.
    Crossfade {
        transition: Transition,
        duration_ms: u64,
        offset_ms: u64,
        inputs: [Label; 2],
        output: Label,
    },
    /// Hard-cut concatenation of `count` streams.
    Concat {
        count: usize,
        inputs: [Label; 2],
        output: Label,
    },
}

/// Compiled graph, or the sentinel for the cheap no-transition path.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FilterGraph {
    /// No segment uses a transition: the assembler can feed ffmpeg a concat
    /// demuxer script instead of a filter graph.
    ConcatOnly,
    Chain { nodes: Vec<FilterNode>, output: Label },
}

/// Compile the expanded timeline into an ordered node list realizing one
/// continuous visual stream.
pub fn compile_filter_graph(timeline: &Timeline) -> SlidereelResult<FilterGraph> {
    timeline.validate()?;

    let segments = timeline.segments();
    if segments.iter().all(|s| s.transition.is_none()) {
        return Ok(FilterGraph::ConcatOnly);
    }

    let count = segments.len();
    let mut nodes = Vec::with_capacity(count * 2);

    for i in 0..count {
        nodes.push(FilterNode::NormalizeTimebase {
            input: Label::Input(i),
            output: Label::Image(i + 1),
        });
    }

    if count == 1 {
        return Ok(FilterGraph::Chain {
            nodes,
            output: Label::Image(1),
        });
    }

    let first = &segments[0];
    nodes.push(pair_node(
        first.transition,
        first.transition_duration_ms,
        first.duration_ms,
        [Label::Image(1), Label::Image(2)],
        Label::Filter(1),
    ));

    // Running offset: durations of everything already folded in, plus the
    // transition overlaps already spent.
    let mut offset_ms = first.duration_ms + first.transition_duration_ms;
    for i in 2..count {
        let prev = &segments[i - 1];
        offset_ms += prev.duration_ms;
        nodes.push(pair_node(
            prev.transition,
            prev.transition_duration_ms,
            offset_ms,
            [Label::Filter(i - 1), Label::Image(i + 1)],
            Label::Filter(i),
        ));
        offset_ms += prev.transition_duration_ms;
    }

    Ok(FilterGraph::Chain {
        nodes,
        output: Label::Filter(count - 1),
    })
}

fn pair_node(
    transition: Transition,
    duration_ms: u64,
    offset_ms: u64,
    inputs: [Label; 2],
    output: Label,
) -> FilterNode {
    if transition.is_none() {
        FilterNode::Concat {
            count: 2,
            inputs,
            output,
        }
    } else {
        FilterNode::Crossfade {
            transition,
            duration_ms,
            offset_ms,
            inputs,
            output,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Segment;
    use std::path::PathBuf;

    fn seg(duration_ms: u64, transition: Transition, transition_duration_ms: u64) -> Segment {
        Segment {
            source: PathBuf::from("img.png"),
            duration_ms,
            transition,
            transition_duration_ms,
        }
    }

    #[test]
    fn all_cuts_compile_to_the_sentinel() {
        let timeline = Timeline::new(vec![
            seg(1000, Transition::None, 0),
            seg(2000, Transition::None, 0),
        ]);
        assert_eq!(
            compile_filter_graph(&timeline).unwrap(),
            FilterGraph::ConcatOnly
        );
    }

    #[test]
    fn single_segment_terminates_at_img1() {
        let timeline = Timeline::new(vec![seg(1000, Transition::None, 0)]);
        // A lone segment with no transition takes the sentinel path.
        assert_eq!(
            compile_filter_graph(&timeline).unwrap(),
            FilterGraph::ConcatOnly
        );
    }

    #[test]
    fn chain_normalizes_every_input_then_folds() {
        let timeline = Timeline::new(vec![
            seg(3500, Transition::Fade, 500),
            seg(4000, Transition::Dissolve, 300),
            seg(3500, Transition::None, 0),
        ]);
        let FilterGraph::Chain { nodes, output } = compile_filter_graph(&timeline).unwrap() else {
            panic!("expected Chain");
        };
        assert_eq!(output, Label::Filter(2));
        assert_eq!(nodes.len(), 5);

        assert_eq!(
            nodes[0],
            FilterNode::NormalizeTimebase {
                input: Label::Input(0),
                output: Label::Image(1),
            }
        );
        assert_eq!(
            nodes[3],
            FilterNode::Crossfade {
                transition: Transition::Fade,
                duration_ms: 500,
                offset_ms: 3500,
                inputs: [Label::Image(1), Label::Image(2)],
                output: Label::Filter(1),
            }
        );
        assert_eq!(
            nodes[4],
            FilterNode::Crossfade {
                transition: Transition::Dissolve,
                duration_ms: 300,
                offset_ms: 8000,
                inputs: [Label::Filter(1), Label::Image(3)],
                output: Label::Filter(2),
            }
        );
    }

    #[test]
    fn cut_in_the_middle_becomes_pairwise_concat() {
        let timeline = Timeline::new(vec![
            seg(1000, Transition::None, 0),
            seg(2000, Transition::Fade, 200),
            seg(3000, Transition::None, 0),
        ]);
        let FilterGraph::Chain { nodes, .. } = compile_filter_graph(&timeline).unwrap() else {
            panic!("expected Chain");
        };
        assert_eq!(
            nodes[3],
            FilterNode::Concat {
                count: 2,
                inputs: [Label::Image(1), Label::Image(2)],
                output: Label::Filter(1),
            }
        );
        // Offset for the second fold: 1000 + 0 + 2000.
        assert_eq!(
            nodes[4],
            FilterNode::Crossfade {
                transition: Transition::Fade,
                duration_ms: 200,
                offset_ms: 3000,
                inputs: [Label::Filter(1), Label::Image(3)],
                output: Label::Filter(2),
            }
        );
    }

    #[test]
    fn offsets_accumulate_prior_transitions() {
        let timeline = Timeline::new(vec![
            seg(3500, Transition::Fade, 500),
            seg(4000, Transition::Dissolve, 300),
            seg(3500, Transition::Pixelize, 250),
            seg(3500, Transition::Fade, 500),
            seg(4000, Transition::None, 0),
        ]);
        let FilterGraph::Chain { nodes, output } = compile_filter_graph(&timeline).unwrap() else {
            panic!("expected Chain");
        };
        assert_eq!(output, Label::Filter(4));

        let offsets: Vec<u64> = nodes
            .iter()
            .filter_map(|n| match n {
                FilterNode::Crossfade { offset_ms, .. } => Some(*offset_ms),
                _ => None,
            })
            .collect();
        assert_eq!(offsets, vec![3500, 8000, 11800, 15550]);
    }

    #[test]
    fn compile_is_deterministic() {
        let timeline = Timeline::new(vec![
            seg(3500, Transition::Fade, 500),
            seg(4000, Transition::None, 0),
        ]);
        assert_eq!(
            compile_filter_graph(&timeline).unwrap(),
            compile_filter_graph(&timeline).unwrap()
        );
    }
}
