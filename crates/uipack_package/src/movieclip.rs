//! Movie clip frame tables (`<itemId>.xml`).
//!
//! ```xml
//! <movieclip pivot="16,16" interval="80" swing="true" repeatDelay="300" frameCount="2">
//!   <frames>
//!     <frame rect="0,0,32,32"/>
//!     <frame rect="2,1,30,31" addDelay="40"/>
//!   </frames>
//! </movieclip>
//! ```

use tracing::{debug, warn};

use crate::tree::Node;
use crate::types::{parse_ints, Rect};

/// One frame of a movie clip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame<T> {
    /// Placement of the frame image inside the clip bounds
    pub rect: Rect,
    /// Delay added on top of the clip interval, in milliseconds
    pub add_delay: i32,
    pub texture: Option<T>,
}

/// Frame sequence with its playback settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieClip<T> {
    pub pivot_x: i32,
    pub pivot_y: i32,
    /// Milliseconds per frame
    pub interval: i32,
    /// Play back and forth instead of wrapping around
    pub swing: bool,
    pub repeat_delay: i32,
    frames: Vec<Frame<T>>,
}

fn int(node: &Node, key: &str) -> Option<i32> {
    node.attribute(key).map(|value| {
        value.trim().parse().unwrap_or_else(|_| {
            debug!(key, value, "malformed number in frame table");
            0
        })
    })
}

impl<T> MovieClip<T> {
    /// Build a clip from its frame table. `texture` yields the image of frame `i`.
    pub fn from_tree(root: &Node, mut texture: impl FnMut(usize) -> Option<T>) -> MovieClip<T> {
        let [pivot_x, pivot_y] = root
            .attribute("pivot")
            .map(parse_ints::<2>)
            .unwrap_or_default();

        let frame_count = int(root, "frameCount").unwrap_or_default().max(0) as usize;
        let nodes = root.first_child().map(Node::children).unwrap_or_default();
        if nodes.len() < frame_count {
            warn!(present = nodes.len(), frame_count, "frames missing from frame table");
        }

        let mut frames = Vec::with_capacity(frame_count.min(nodes.len()));
        for (index, node) in nodes.iter().take(frame_count).enumerate() {
            let [x, y, width, height] = node
                .attribute("rect")
                .map(parse_ints::<4>)
                .unwrap_or_default();

            frames.push(Frame {
                rect: Rect::new(x, y, width, height),
                add_delay: int(node, "addDelay").unwrap_or_default(),
                texture: texture(index),
            });
        }

        MovieClip {
            pivot_x,
            pivot_y,
            interval: int(root, "interval").unwrap_or_default(),
            swing: root.attribute("swing") == Some("true"),
            repeat_delay: int(root, "repeatDelay").unwrap_or_default(),
            frames,
        }
    }

    pub fn frames(&self) -> &[Frame<T>] {
        &self.frames
    }

    /// Total playback time of one pass, without the repeat delay
    pub fn duration(&self) -> i32 {
        self.frames.iter().fold(0, |total: i32, frame| {
            total.saturating_add(self.interval.saturating_add(frame.add_delay))
        })
    }
}
