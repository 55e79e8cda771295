//! Interaction controller for one open image.
//!
//! A [`Session`] owns everything a mosaic UI keeps per image: the pristine
//! original, the working buffer, the undo history, the active mask and the
//! sizing settings. Input arrives as press / drag / release events in image
//! pixel coordinates and drives a small state machine:
//!
//! ```text
//!            begin_mask_selection            press
//!   ┌──────┐ ─────────────────────▶ SettingMask ──▶ (origin) ── release ─┐
//!   │ Idle │ ◀──────────────────────────────────────────────────────────┘
//!   └──────┘ ── press ──▶ Dragging ── drag_to* ──▶ Dragging ── release ──▶ Idle
//!       ▲  │
//!       │  └── toggle_preview ──▶ Previewing ── toggle_preview ──┐
//!       └──────────────────────────────────────────────────────────┘
//! ```
//!
//! `drag_to` only reports the rubber-band rectangle; the compositor runs
//! exactly once, on release. Every release that changes pixels pushes one
//! history entry.

use crate::history::{DEFAULT_MAX_DEPTH, History};
use crate::imaging::{
    Averaging, ImageBuffer, MosaicEngine, MosaicError, Multiplier, Point, Rect, RegionCompositor,
    SizePolicy, compute_block_size, drag_stride, interaction_points, snap_to_grid,
};
use crate::metadata::{MosaicMetadata, ReferencePoint};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionState {
    Idle,
    SettingMask,
    Dragging,
    Previewing,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("cannot {action} while {state:?}")]
    InvalidState {
        action: &'static str,
        state: InteractionState,
    },
    #[error(transparent)]
    Mosaic(#[from] MosaicError),
}

/// What a release did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Pixels changed and a history entry was pushed.
    Edited,
    /// The mask selection finished.
    MaskSet(Rect),
    /// Nothing changed (outside the image, outside the mask, empty selection
    /// or an area that was already uniform).
    Unchanged,
}

/// Sizing and history settings a session starts with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    pub policy: SizePolicy,
    pub multiplier: Multiplier,
    pub averaging: Averaging,
    pub max_history: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            policy: SizePolicy::Proportional,
            multiplier: Multiplier::default(),
            averaging: Averaging::default(),
            max_history: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    original: ImageBuffer,
    current: ImageBuffer,
    history: History,
    compositor: RegionCompositor,
    policy: SizePolicy,
    multiplier: Multiplier,
    mask: Option<Rect>,
    state: InteractionState,
    origin: Option<Point>,
    loaded_reference: Option<ReferencePoint>,
    reference_point: Option<ReferencePoint>,
}

impl Session {
    pub fn new(image: ImageBuffer, settings: SessionSettings) -> Self {
        Self {
            history: History::new(image.clone(), settings.max_history),
            current: image.clone(),
            original: image,
            compositor: RegionCompositor::new(MosaicEngine::new(settings.averaging)),
            policy: settings.policy,
            multiplier: settings.multiplier,
            mask: None,
            state: InteractionState::Idle,
            origin: None,
            loaded_reference: None,
            reference_point: None,
        }
    }

    /// Carry over a reference point read from the file's metadata.
    pub fn with_reference_point(mut self, reference: Option<ReferencePoint>) -> Self {
        self.loaded_reference = reference;
        self.reference_point = reference;
        self
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn state(&self) -> InteractionState {
        self.state
    }

    /// The working buffer with all edits applied.
    pub fn image(&self) -> &ImageBuffer {
        &self.current
    }

    pub fn original(&self) -> &ImageBuffer {
        &self.original
    }

    /// What a viewer should show: the original while previewing, the
    /// working buffer otherwise.
    pub fn displayed(&self) -> &ImageBuffer {
        match self.state {
            InteractionState::Previewing => &self.original,
            _ => &self.current,
        }
    }

    pub fn is_modified(&self) -> bool {
        self.current != self.original
    }

    pub fn mask(&self) -> Option<Rect> {
        self.mask
    }

    pub fn policy(&self) -> SizePolicy {
        self.policy
    }

    pub fn multiplier(&self) -> Multiplier {
        self.multiplier
    }

    pub fn reference_point(&self) -> Option<ReferencePoint> {
        self.reference_point
    }

    /// Effective cell size: the policy size for this image times the multiplier.
    pub fn block_size(&self) -> u32 {
        let base = compute_block_size(self.policy, self.current.height(), self.current.width());
        self.multiplier.apply(base)
    }

    /// Metadata describing the current edits, ready to embed on save.
    pub fn metadata(&self, software: Option<String>, note: Option<String>) -> MosaicMetadata {
        MosaicMetadata {
            software,
            processing_note: note,
            reference_point: self.reference_point,
            mosaic_size: Some(self.block_size()),
        }
    }

    // ---------------------------------------------------------------------
    // Pointer events
    // ---------------------------------------------------------------------

    fn refuse<T>(&self, action: &'static str) -> Result<T, SessionError> {
        Err(SessionError::InvalidState {
            action,
            state: self.state,
        })
    }

    fn set_state(&mut self, next: InteractionState) {
        if self.state != next {
            log::debug!("session {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    /// Enter mask selection; the next press/release pair defines the mask.
    pub fn begin_mask_selection(&mut self) -> Result<(), SessionError> {
        if self.state != InteractionState::Idle {
            return self.refuse("select a mask");
        }
        self.origin = None;
        self.set_state(InteractionState::SettingMask);
        Ok(())
    }

    pub fn clear_mask(&mut self) {
        if self.mask.take().is_some() {
            log::debug!("mask cleared");
        }
    }

    pub fn press(&mut self, p: Point) -> Result<(), SessionError> {
        match self.state {
            InteractionState::Idle => {
                self.origin = Some(p);
                self.set_state(InteractionState::Dragging);
                Ok(())
            }
            InteractionState::SettingMask => {
                self.origin = Some(p);
                Ok(())
            }
            InteractionState::Dragging | InteractionState::Previewing => self.refuse("press"),
        }
    }

    /// Rubber-band rectangle from the press origin to `p`. Never edits.
    pub fn drag_to(&self, p: Point) -> Option<Rect> {
        match self.state {
            InteractionState::Dragging | InteractionState::SettingMask => {
                self.origin.map(|origin| Rect::from_corners(origin, p))
            }
            _ => None,
        }
    }

    pub fn release(&mut self, p: Point) -> Result<ReleaseOutcome, SessionError> {
        match self.state {
            InteractionState::Dragging => {
                let Some(origin) = self.origin.take() else {
                    self.set_state(InteractionState::Idle);
                    return Ok(ReleaseOutcome::Unchanged);
                };
                self.set_state(InteractionState::Idle);
                self.apply(Rect::from_corners(origin, p), p)
            }
            InteractionState::SettingMask => {
                let Some(origin) = self.origin.take() else {
                    return self.refuse("release without a press");
                };
                self.set_state(InteractionState::Idle);
                let selection = Rect::from_corners(origin, p);
                match selection.clip(self.current.width(), self.current.height()) {
                    Some(mask) => {
                        log::debug!("mask set to {mask:?}");
                        self.mask = Some(mask);
                        Ok(ReleaseOutcome::MaskSet(mask))
                    }
                    None => Ok(ReleaseOutcome::Unchanged),
                }
            }
            InteractionState::Idle | InteractionState::Previewing => self.refuse("release"),
        }
    }

    /// A press and release at the same point.
    pub fn click(&mut self, p: Point) -> Result<ReleaseOutcome, SessionError> {
        self.press(p)?;
        self.release(p)
    }

    /// Run one edit. A drag without area is a point click.
    fn apply(&mut self, drag: Rect, end: Point) -> Result<ReleaseOutcome, SessionError> {
        let block_size = self.block_size();
        let anchor = if drag.is_empty() {
            match self.mask {
                // One virtual click, routed through the compositor so the
                // mask still confines it.
                Some(mask) => {
                    if !mask.contains(end) {
                        return Ok(ReleaseOutcome::Unchanged);
                    }
                    let single = Rect::new(end.x, end.y, end.x + 1, end.y + 1);
                    self.compositor
                        .apply_drag(&mut self.current, single, block_size, self.mask)?;
                }
                None => {
                    self.compositor
                        .engine()
                        .pixelate_at_point(&mut self.current, end, block_size)?;
                }
            }
            snap_to_grid(end, block_size)
        } else {
            self.compositor
                .apply_drag(&mut self.current, drag, block_size, self.mask)?;
            let start = match self.mask {
                None => interaction_points(
                    &drag,
                    drag_stride(block_size),
                    &self.current.bounds(),
                )
                .next(),
                Some(_) => drag
                    .clip(self.current.width(), self.current.height())
                    .map(|r| Point::new(r.x1, r.y1)),
            }
            .unwrap_or(Point::new(drag.x1, drag.y1));
            snap_to_grid(start, block_size)
        };

        if &self.current == self.history.current() {
            return Ok(ReleaseOutcome::Unchanged);
        }
        self.history.push(self.current.clone());
        if self.reference_point.is_none() {
            self.reference_point = Some(ReferencePoint {
                x: anchor.x,
                y: anchor.y,
                mosaic_size: block_size,
            });
        }
        Ok(ReleaseOutcome::Edited)
    }

    // ---------------------------------------------------------------------
    // History and modes
    // ---------------------------------------------------------------------

    fn require_idle(&self, action: &'static str) -> Result<(), SessionError> {
        if self.state == InteractionState::Idle {
            Ok(())
        } else {
            self.refuse(action)
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Step back one edit. `Ok(false)` when there is nothing to undo.
    pub fn undo(&mut self) -> Result<bool, SessionError> {
        self.require_idle("undo")?;
        Ok(match self.history.undo() {
            Some(snapshot) => {
                self.current = snapshot;
                true
            }
            None => false,
        })
    }

    /// Re-apply an undone edit. `Ok(false)` when there is nothing to redo.
    pub fn redo(&mut self) -> Result<bool, SessionError> {
        self.require_idle("redo")?;
        Ok(match self.history.redo() {
            Some(snapshot) => {
                self.current = snapshot;
                true
            }
            None => false,
        })
    }

    /// Throw away every edit and return to the original image.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        if self.state == InteractionState::Dragging {
            return self.refuse("reset");
        }
        self.current = self.original.clone();
        self.history.reset(self.original.clone());
        self.reference_point = self.loaded_reference;
        self.origin = None;
        self.set_state(InteractionState::Idle);
        log::debug!("session reset to original");
        Ok(())
    }

    /// Switch between editing and showing the original. Returns whether
    /// preview is now on.
    pub fn toggle_preview(&mut self) -> Result<bool, SessionError> {
        match self.state {
            InteractionState::Idle => {
                self.set_state(InteractionState::Previewing);
                Ok(true)
            }
            InteractionState::Previewing => {
                self.set_state(InteractionState::Idle);
                Ok(false)
            }
            _ => self.refuse("toggle preview"),
        }
    }

    /// Change the size policy. Edits made under the old size are discarded.
    pub fn set_policy(&mut self, policy: SizePolicy) -> Result<(), SessionError> {
        self.require_idle("change the size mode")?;
        if policy != self.policy {
            self.policy = policy;
            self.reset()?;
        }
        Ok(())
    }

    /// Change the multiplier. Edits made under the old size are discarded.
    pub fn set_multiplier(&mut self, multiplier: Multiplier) -> Result<(), SessionError> {
        self.require_idle("change the multiplier")?;
        if multiplier != self.multiplier {
            self.multiplier = multiplier;
            self.reset()?;
        }
        Ok(())
    }
}
