//! Visibility scheduling for lazily loaded result rows.
//!
//! A row fetches its detail only once it has been on screen. The loader keeps
//! every observed slot until the first time its bounds intersect the viewport
//! (grown by a root margin), fires it, and then forgets it for good: a fired
//! slot never fires again, even if it is observed a second time.

use std::collections::{HashMap, HashSet};

use futures::channel::oneshot;

/// Axis-aligned rectangle in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Touching edges count as intersecting.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x <= other.right()
            && other.x <= self.right()
            && self.y <= other.bottom()
            && other.y <= self.bottom()
    }

    /// Grow by `margin` on every side.
    pub fn expand(&self, margin: f64) -> Rect {
        Rect::new(
            self.x - margin,
            self.y - margin,
            self.width + 2.0 * margin,
            self.height + 2.0 * margin,
        )
    }
}

/// Opaque, never reused identifier of a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub u64);

/// A placeholder waiting to become visible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityTarget {
    pub slot: SlotId,
    pub bounds: Rect,
}

/// Something that turns placeholders into one-shot "became visible" signals.
pub trait VisibilityScheduler {
    /// Start watching `target`. Already-fired slots are ignored.
    fn observe(&mut self, target: VisibilityTarget);

    /// Stop watching `slot`. Returns whether it was still pending.
    fn unobserve(&mut self, slot: SlotId) -> bool;

    /// Drop every pending slot.
    fn clear(&mut self);

    /// Number of slots still waiting.
    fn pending(&self) -> usize;
}

/// Poll-driven scheduler: the host reports the viewport rectangle and the
/// loader answers with the slots that just became visible.
#[derive(Debug)]
pub struct ViewportLoader {
    root_margin: f64,
    pending: Vec<VisibilityTarget>,
    fired: HashSet<SlotId>,
    waiters: HashMap<SlotId, Vec<oneshot::Sender<()>>>,
}

impl ViewportLoader {
    pub fn new(root_margin: f64) -> Self {
        Self {
            root_margin: root_margin.max(0.0),
            pending: Vec::new(),
            fired: HashSet::new(),
            waiters: HashMap::new(),
        }
    }

    pub fn root_margin(&self) -> f64 {
        self.root_margin
    }

    /// Watch every target, in order.
    pub fn observe_all(&mut self, targets: impl IntoIterator<Item = VisibilityTarget>) {
        for target in targets {
            self.observe(target);
        }
    }

    /// Watch `target` and get a receiver that resolves when it fires.
    ///
    /// The receiver is cancelled if the slot is unobserved or cleared first,
    /// or if the slot has already fired.
    pub fn observe_once(&mut self, target: VisibilityTarget) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        if !self.fired.contains(&target.slot) {
            self.observe(target);
            self.waiters.entry(target.slot).or_default().push(tx);
        }
        rx
    }

    /// Fire every pending slot whose bounds touch `viewport` grown by the root
    /// margin. Returns them in observation order.
    pub fn poll(&mut self, viewport: Rect) -> Vec<SlotId> {
        let area = viewport.expand(self.root_margin);
        let mut visible = Vec::new();
        self.pending.retain(|target| {
            if target.bounds.intersects(&area) {
                visible.push(target.slot);
                false
            } else {
                true
            }
        });

        for slot in &visible {
            self.fired.insert(*slot);
            for tx in self.waiters.remove(slot).unwrap_or_default() {
                let _ = tx.send(());
            }
        }
        if !visible.is_empty() {
            log::debug!(
                "viewport: {} slot(s) visible, {} pending",
                visible.len(),
                self.pending.len()
            );
        }
        visible
    }

    pub fn has_fired(&self, slot: SlotId) -> bool {
        self.fired.contains(&slot)
    }

    /// Number of slots remembered as fired.
    pub fn fired_count(&self) -> usize {
        self.fired.len()
    }
}

impl VisibilityScheduler for ViewportLoader {
    fn observe(&mut self, target: VisibilityTarget) {
        if self.fired.contains(&target.slot) {
            log::trace!("viewport: {:?} already fired", target.slot);
            return;
        }
        match self.pending.iter_mut().find(|t| t.slot == target.slot) {
            Some(existing) => existing.bounds = target.bounds,
            None => self.pending.push(target),
        }
    }

    fn unobserve(&mut self, slot: SlotId) -> bool {
        self.waiters.remove(&slot);
        let before = self.pending.len();
        self.pending.retain(|t| t.slot != slot);
        self.pending.len() != before
    }

    fn clear(&mut self) {
        self.pending.clear();
        self.waiters.clear();
    }

    fn pending(&self) -> usize {
        self.pending.len()
    }
}
