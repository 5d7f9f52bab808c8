use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MovieError, Result};
use crate::filters::resize::{fit_dimensions, resize_area};
use crate::frame::Frame;

/// Direction the output sequence plays in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Playback {
    Forward,
    /// Forward, then back again without repeating the turnaround frames.
    #[default]
    ForwardBackward,
}

impl fmt::Display for Playback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => write!(f, "forward"),
            Self::ForwardBackward => write!(f, "forward-backward"),
        }
    }
}

impl FromStr for Playback {
    type Err = MovieError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "forward" => Ok(Self::Forward),
            "forward-backward" => Ok(Self::ForwardBackward),
            other => Err(MovieError::Config(format!("unknown playback mode '{other}'"))),
        }
    }
}

/// Positions into the forward sequence, in playback order.
///
/// `ForwardBackward` appends the reverse of the forward sequence minus its
/// first and last frames: `2n - 2` entries for `n >= 2`, one for `n == 1`.
pub fn playback_order(count: usize, playback: Playback) -> Vec<usize> {
    let mut order: Vec<usize> = (0..count).collect();
    if playback == Playback::ForwardBackward && count > 2 {
        order.extend((1..count - 1).rev());
    }
    order
}

/// Enhanced frames of one volume plus the order they play in.
///
/// Frames are stored once in slice order; the backward half of a
/// forward-backward sequence refers back to them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameSequence {
    frames: Vec<Frame>,
    order: Vec<usize>,
    playback: Playback,
}

impl FrameSequence {
    /// Order `frames` by slice index and lay out the playback sequence.
    pub fn new(mut frames: Vec<Frame>, playback: Playback) -> Result<Self> {
        if frames.is_empty() {
            return Err(MovieError::Processing("no frames to assemble".into()));
        }
        frames.sort_by_key(|f| f.slice_index);
        let (h, w) = frames[0].data.dim();
        if let Some(odd) = frames.iter().find(|f| f.data.dim() != (h, w)) {
            return Err(MovieError::Processing(format!(
                "frame {} is {}x{}, expected {h}x{w}",
                odd.slice_index,
                odd.height(),
                odd.width()
            )));
        }
        let order = playback_order(frames.len(), playback);
        Ok(Self {
            frames,
            order,
            playback,
        })
    }

    /// Number of frames in playback order.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn playback(&self) -> Playback {
        self.playback
    }

    /// Frames in playback order.
    pub fn iter(&self) -> impl Iterator<Item = &Frame> + '_ {
        self.order.iter().map(move |&i| &self.frames[i])
    }

    /// The forward sequence: one frame per retained slice, in slice order.
    pub fn forward(&self) -> &[Frame] {
        &self.frames
    }

    /// (height, width) shared by every frame.
    pub fn frame_dims(&self) -> (usize, usize) {
        self.frames[0].data.dim()
    }
}

/// Resizes enhanced frames and orders them for playback.
#[derive(Clone, Copy, Debug)]
pub struct FrameAssembler {
    pub output_size: usize,
    pub allow_upscale: bool,
    pub playback: Playback,
}

impl FrameAssembler {
    /// Bound the frame's longer side by `output_size`, keeping aspect ratio.
    pub fn fit(&self, frame: Frame) -> Frame {
        let (h, w) = fit_dimensions(
            frame.height(),
            frame.width(),
            self.output_size,
            self.allow_upscale,
        );
        if (h, w) == frame.data.dim() {
            return frame;
        }
        Frame::new(resize_area(&frame.data, h, w), frame.slice_index)
    }

    pub fn assemble(&self, frames: Vec<Frame>) -> Result<FrameSequence> {
        FrameSequence::new(frames, self.playback)
    }
}
