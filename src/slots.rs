//! Finding the free space on a row of text.
//!
//! A row is a horizontal strip of the canvas, as tall as a line of text. Each
//! flow shape that reaches into the strip blocks the part of it between the
//! leftmost and rightmost points of its boundary on that strip (its
//! [`Intrusion`]), and its flow policy decides which of the remaining sides
//! are usable. What's left over is a list of disjoint rectangles, or "slots",
//! each of which gets at most one fragment of a line.

use arrayvec::ArrayVec;
use kurbo::Rect;

use crate::{
    clip::clip_line,
    shape::{FlowShape, FlowType, TextDirection},
};

/// How far a shape reaches into a row strip.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct Intrusion {
    /// The leftmost x of the shape's boundary on the strip.
    pub min: f64,
    /// The rightmost x of the shape's boundary on the strip.
    pub max: f64,
}

/// Computes how far `shape` reaches into `strip`.
///
/// The shape's edges are clipped to the part of the strip's rows that lies
/// inside `container`, so a shape can intrude even if it is horizontally
/// outside the strip. Edges outside the container are ignored. Returns
/// `None` if no edge meets that region.
pub fn intrusion(shape: &FlowShape, strip: Rect, container: Rect) -> Option<Intrusion> {
    let strip = strip.abs();
    let container = container.abs();
    let bounds = shape.bounds()?;
    if bounds.y1 < strip.y0 || bounds.y0 > strip.y1 {
        return None;
    }

    let band = Rect::new(container.x0, strip.y0, container.x1, strip.y1);
    let mut ret: Option<Intrusion> = None;
    shape.for_each_edge_in(strip.y0, strip.y1, |edge| {
        let Some(clipped) = clip_line(edge, band) else {
            return;
        };
        for x in [clipped.p0.x, clipped.p1.x] {
            ret = Some(match ret {
                Some(i) => Intrusion {
                    min: i.min.min(x),
                    max: i.max.max(x),
                },
                None => Intrusion { min: x, max: x },
            });
        }
    });
    ret
}

// The part of `slot` that is horizontally inside `allowed`, if any.
fn restrict(slot: Rect, allowed: Rect) -> Rect {
    Rect::new(
        slot.x0.max(allowed.x0),
        slot.y0,
        slot.x1.min(allowed.x1),
        slot.y1,
    )
}

fn has_width(slot: &Rect) -> bool {
    slot.x1 > slot.x0
}

/// Computes free slots on row strips, reusing its buffers between calls.
#[derive(Clone, Debug, Default)]
pub struct SlotFinder {
    slots: Vec<Rect>,
}

impl SlotFinder {
    /// Creates a finder with empty buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds the free parts of `strip`, ordered from left to right.
    ///
    /// `container` is the full row that `strip` is part of (in multi-column
    /// layouts, `strip` is one column's share of it): shapes carve up the
    /// container, and the result is then cut down to the strip. The returned
    /// slots are pairwise disjoint, lie inside `strip`, and have positive
    /// width.
    pub fn find_slots(
        &mut self,
        strip: Rect,
        container: Rect,
        shapes: &[FlowShape],
        direction: TextDirection,
    ) -> &[Rect] {
        let strip = strip.abs();
        let container = container.abs();
        self.slots.clear();
        self.slots
            .push(Rect::new(container.x0, strip.y0, container.x1, strip.y1));

        let mut intruded = false;
        for shape in shapes {
            let flow = shape.flow().resolve(direction);
            if flow == FlowType::None {
                continue;
            }
            let Some(Intrusion { min, max }) = intrusion(shape, strip, container) else {
                continue;
            };
            intruded = true;

            let mut allowed = ArrayVec::<Rect, 2>::new();
            if flow.allows_left() {
                allowed.push(Rect::new(container.x0, strip.y0, min, strip.y1));
            }
            if flow.allows_right() {
                allowed.push(Rect::new(max, strip.y0, container.x1, strip.y1));
            }
            self.restrict_to(&allowed);

            // Shapes that only allow one side also act as barriers for the
            // other one.
            match flow {
                FlowType::Left => self.slots.iter_mut().for_each(|s| s.x1 = s.x1.min(min)),
                FlowType::Right => self.slots.iter_mut().for_each(|s| s.x0 = s.x0.max(max)),
                _ => {}
            }
            self.slots
                .retain(|s| has_width(s) && !(s.x0 >= min && s.x1 <= max));
        }

        if !intruded {
            self.slots.clear();
            self.slots.push(strip);
        }

        for slot in &mut self.slots {
            *slot = restrict(*slot, strip);
        }
        self.slots.retain(has_width);
        self.slots.sort_by(|a, b| a.x0.total_cmp(&b.x0));

        tracing::trace!(?strip, slots = ?self.slots, "found slots");
        &self.slots
    }

    // Cuts every slot down to the first allowed candidate, and adds its
    // overlap with the second candidate as a new slot.
    fn restrict_to(&mut self, allowed: &[Rect]) {
        let Some((first, rest)) = allowed.split_first() else {
            self.slots.clear();
            return;
        };
        let count = self.slots.len();
        for i in 0..count {
            let slot = self.slots[i];
            self.slots[i] = restrict(slot, *first);
            for other in rest {
                self.slots.push(restrict(slot, *other));
            }
        }
    }
}

/// Finds the free parts of `strip`, see [`SlotFinder::find_slots`].
pub fn find_slots(
    strip: Rect,
    container: Rect,
    shapes: &[FlowShape],
    direction: TextDirection,
) -> Vec<Rect> {
    SlotFinder::new()
        .find_slots(strip, container, shapes, direction)
        .to_vec()
}
