// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Canvas controller.
//!
//! The controller owns the label store, the undo stack, the modified-box set
//! and the group selection, and is the only writer of any of them. Cells
//! report to it through [`CellObserver`]; pointer input is routed through the
//! mode state machine before any cell sees it.

use super::cell::{Cell, CellChange, CellId, CellObserver, Modifiers};
use super::frames::FrameCursor;
use super::group::{GroupSelection, MemberSnapshot};
use super::mode::{Mode, ModeMachine};
use super::notice::Notice;
use super::undo::UndoStack;
use crate::models::label::LabelId;
use crate::models::session::AnnotationSession;
use crate::models::store::{FrameId, LabelStore};
use crate::util::geometry::{CanvasSize, CellKey, Point, Rect};
use std::collections::BTreeSet;
use std::rc::Rc;
use std::time::Instant;

/// Called with the full store after every mutation.
pub type DataUpdateHook = Box<dyn FnMut(&LabelStore)>;

/// The pointer gesture in progress.
#[derive(Debug, Clone, Copy)]
enum Press {
    /// Drawing a cell (or a marquee) from `start`.
    Canvas { start: Point },
    /// Pressed on a cell. Cells inside an active group are not draggable.
    Cell {
        id: CellId,
        start: Point,
        draggable: bool,
        moved: bool,
    },
    /// Pressed inside the group area.
    Group { last: Point, moved: bool },
}

/// State the cells report into.
struct CanvasCore {
    session: Rc<AnnotationSession>,
    store: LabelStore,
    undo: UndoStack,
    modified: BTreeSet<CellKey>,
    group: GroupSelection,
    mode: ModeMachine,
    preview: Option<Rect>,
    cursor: FrameCursor,
    notices: Vec<Notice>,
    on_data_update: Option<DataUpdateHook>,
}

impl CanvasCore {
    fn notify(&mut self, notice: Notice) {
        notice.log();
        self.notices.push(notice);
    }

    fn publish(&mut self) {
        if let Some(hook) = self.on_data_update.as_mut() {
            hook(&self.store);
        }
    }
}

impl CellObserver for CanvasCore {
    fn on_update(&mut self, cell: &Cell, change: CellChange) {
        let frame = self.cursor.current.id.as_str();
        let key = cell.key();
        match cell.label() {
            Some(label) => {
                self.store.insert(frame, key.clone(), self.session.labels.name(label));
                let tracked = matches!(change, CellChange::Placed | CellChange::Restored);
                if tracked && self.cursor.next_unvisited() {
                    self.modified.insert(key);
                }
            }
            None => {
                self.store.remove(frame, &key);
                self.modified.remove(&key);
            }
        }
        if self.group.contains(cell.id()) {
            self.group.add(cell.id(), cell.rect());
        }
        self.publish();
    }

    fn on_delete(&mut self, cell: &Cell) {
        self.undo.remove(cell.id());
        self.group.remove(cell.id());
        log::info!("Deleted cell {} on {}", cell.key(), self.cursor.current.id);
        self.on_update(cell, CellChange::Vacated);
    }

    fn on_selection_changed(&mut self, cell: &Cell, selected: bool) {
        if selected {
            self.group.add(cell.id(), cell.rect());
        } else {
            self.group.remove(cell.id());
        }
    }

    fn on_drag_start(&mut self, _cell: &Cell) {
        self.mode.begin_drag();
        self.preview = None;
    }
}

/// Owner of the current frame's cells and of all annotation state.
pub struct CanvasController {
    core: CanvasCore,
    /// Rendered cells of the current frame, bottom to top.
    cells: Vec<Cell>,
    canvas: CanvasSize,
    modifiers: Modifiers,
    press: Option<Press>,
    click_target: Option<CellId>,
    next_id: u64,
}

impl CanvasController {
    pub fn new(session: Rc<AnnotationSession>, canvas: CanvasSize, cursor: FrameCursor) -> Self {
        let undo = UndoStack::new(session.settings.max_undo);
        let mode = ModeMachine::new(session.settings.settle_delay);
        Self {
            core: CanvasCore {
                session,
                store: LabelStore::new(),
                undo,
                modified: BTreeSet::new(),
                group: GroupSelection::new(),
                mode,
                preview: None,
                cursor,
                notices: Vec::new(),
                on_data_update: None,
            },
            cells: Vec::new(),
            canvas,
            modifiers: Modifiers::default(),
            press: None,
            click_target: None,
            next_id: 0,
        }
    }

    /// Register the external hook that receives the store after each change.
    pub fn set_data_update_hook(&mut self, hook: DataUpdateHook) {
        self.core.on_data_update = Some(hook);
    }

    /// Seed the store, e.g. from auto-saved data. Call `reload_state` to render it.
    pub fn load_data(&mut self, store: LabelStore) {
        log::info!("Loaded {} labeled cells", store.cell_count());
        self.core.store = store;
    }

    pub fn store(&self) -> &LabelStore {
        &self.core.store
    }

    pub fn session(&self) -> &AnnotationSession {
        &self.core.session
    }

    pub fn cursor(&self) -> &FrameCursor {
        &self.core.cursor
    }

    pub fn current_frame(&self) -> &FrameId {
        &self.core.cursor.current.id
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.iter().find(|c| c.id() == id)
    }

    /// Topmost rendered cell under `point`.
    pub fn cell_at(&self, point: Point) -> Option<CellId> {
        self.cells
            .iter()
            .rev()
            .find(|c| c.rendered_rect().is_some_and(|r| r.contains(point)))
            .map(Cell::id)
    }

    pub fn mode(&self) -> Mode {
        self.core.mode.current()
    }

    /// Mode after applying any settle that is due at `now`.
    pub fn poll_mode(&mut self, now: Instant) -> Mode {
        self.core.mode.poll(now)
    }

    /// The transient rectangle shown while drawing.
    pub fn preview(&self) -> Option<Rect> {
        self.core.preview
    }

    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.modifiers = modifiers;
    }

    /// Drain notices raised since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.core.notices)
    }

    pub(crate) fn notify(&mut self, notice: Notice) {
        self.core.notify(notice);
    }

    /// Keys changed on this frame that will be carried forward.
    pub fn modified_keys(&self) -> &BTreeSet<CellKey> {
        &self.core.modified
    }

    pub fn undo_len(&self) -> usize {
        self.core.undo.len()
    }

    pub fn is_group_selected(&self) -> bool {
        self.core.group.is_active()
    }

    pub fn group_members(&self) -> Vec<CellId> {
        self.core.group.member_ids()
    }

    /// Bounding rectangle dragged when the group moves.
    pub fn group_wrapper(&self) -> Option<Rect> {
        self.core.group.wrapper()
    }

    /// Create and render a cell, recording it for undo.
    ///
    /// Boxes below the configured area are rejected with a notice and leave
    /// all state untouched.
    pub fn create_cell(&mut self, rect: Rect, label: LabelId) -> Option<CellId> {
        if !self.accept_box(&rect) {
            return None;
        }
        let id = self.allocate_id();
        let mut cell = Cell::new(id, rect, label);
        cell.render(CellChange::Placed, &mut self.core);
        self.cells.push(cell);
        self.core.undo.push(id);
        log::info!("Created cell {} on {}", rect.key(), self.core.cursor.current.id);
        Some(id)
    }

    /// Delete a cell, removing it from the store, undo history and group.
    pub fn delete_cell(&mut self, id: CellId) -> bool {
        self.with_cell(id, |cell, core| cell.delete(core)).is_some()
    }

    /// Remove the most recently created cell once `confirm` agrees.
    pub fn undo(&mut self, confirm: impl FnOnce() -> bool) -> bool {
        if self.core.undo.is_empty() {
            self.core.notify(Notice::NothingToUndo);
            return false;
        }
        if !confirm() {
            return false;
        }
        match self.core.undo.pop() {
            Some(id) => {
                log::info!("Undo");
                self.delete_cell(id)
            }
            None => false,
        }
    }

    pub fn reset_undo_stack(&mut self) {
        self.core.undo.clear();
    }

    /// Rebuild the cells for the frame `cursor` points at from the store.
    pub fn reload_state(&mut self, cursor: FrameCursor) {
        self.cells.clear();
        self.core.group.clear();
        self.core.preview = None;
        self.core.mode.reset();
        self.press = None;
        self.click_target = None;
        self.core.cursor = cursor;

        let frame = self.core.cursor.current.id.clone();
        let entries: Vec<(CellKey, String)> = self
            .core
            .store
            .frame(&frame)
            .map(|labels| labels.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();

        for (key, name) in entries {
            let rect = match key.parse() {
                Ok(rect) => rect,
                Err(err) => {
                    log::debug!("{:#}", err);
                    self.core.notify(Notice::MalformedKey { frame: frame.clone(), key });
                    continue;
                }
            };
            let Some(label) = self.core.session.labels.find(&name) else {
                self.core.notify(Notice::UnknownLabel {
                    frame: frame.clone(),
                    key,
                    label: name,
                });
                continue;
            };
            if rect.key() != key {
                // Re-key entries written with fractional coordinates
                self.core.store.remove(&frame, &key);
            }
            let id = self.allocate_id();
            let mut cell = Cell::new(id, rect, label);
            cell.render(CellChange::Restored, &mut self.core);
            self.cells.push(cell);
        }
        log::debug!("Rendered {} cells on {}", self.cells.len(), frame);
    }

    /// Add cells to the group selection.
    pub fn select_group(&mut self, ids: &[CellId]) {
        for cell in self.cells.iter_mut() {
            if ids.contains(&cell.id()) && !cell.is_selected() {
                cell.set_selected(true);
                self.core.on_selection_changed(cell, true);
            }
        }
    }

    /// Move every group member by the same offset.
    ///
    /// The offset is limited so the group wrapper stays on the canvas; the
    /// applied offset is returned. Members are committed in two passes so a
    /// member landing on another member's old key is not erased by it.
    pub fn drag_group(&mut self, dx: i32, dy: i32) -> (i32, i32) {
        let Some(wrapper) = self.core.group.wrapper() else {
            return (0, 0);
        };
        let target = wrapper.contain_origin(wrapper.origin().offset(dx, dy), self.canvas);
        let (dx, dy) = target.delta_from(wrapper.origin());
        if dx == 0 && dy == 0 {
            return (0, 0);
        }

        let members = self.core.group.member_ids();
        self.core.group.translate(dx, dy);

        let mut vacated = Vec::with_capacity(members.len());
        for cell in self.cells.iter_mut().filter(|c| members.contains(&c.id())) {
            let origin = cell.rect().origin().offset(dx, dy);
            cell.drag_to(origin);
            if let Some(label) = cell.vacate(&mut self.core) {
                vacated.push((cell.id(), label));
            }
        }
        for (id, label) in vacated {
            if let Some(cell) = self.cells.iter_mut().find(|c| c.id() == id) {
                cell.settle(label, &mut self.core);
            }
        }
        (dx, dy)
    }

    /// Clear the group selection and give cells back their own dragging.
    pub fn deselect_group(&mut self) {
        if !self.core.group.is_active() {
            return;
        }
        for cell in self.cells.iter_mut().filter(|c| c.is_selected()) {
            cell.set_selected(false);
        }
        self.core.group.clear();
    }

    /// Describe the group by value so it can be re-selected on another frame.
    pub fn group_snapshot(&self) -> Vec<MemberSnapshot> {
        let labels = &self.core.session.labels;
        self.cells
            .iter()
            .filter(|c| self.core.group.contains(c.id()))
            .filter_map(|c| {
                c.label().map(|label| MemberSnapshot {
                    rect: c.rect(),
                    label: labels.name(label).to_string(),
                })
            })
            .collect()
    }

    /// Select the cells matching a snapshot taken on the previous frame.
    pub fn restore_group(&mut self, members: &[MemberSnapshot]) {
        if members.is_empty() {
            return;
        }
        let labels = &self.core.session.labels;
        let ids: Vec<CellId> = self
            .cells
            .iter()
            .filter(|c| {
                members.iter().any(|m| {
                    m.rect == c.rect() && c.label().is_some_and(|l| labels.name(l) == m.label)
                })
            })
            .map(Cell::id)
            .collect();
        self.select_group(&ids);
    }

    /// Click on a cell, interpreted against the current mode and modifiers.
    pub fn click_cell(&mut self, id: CellId, now: Instant) {
        let mode = self.core.mode.poll(now);
        let modifiers = self.modifiers;
        let session = Rc::clone(&self.core.session);
        self.with_cell(id, |cell, core| cell.on_click(mode, modifiers, &session.labels, core));
    }

    pub fn pointer_down(&mut self, point: Point, now: Instant) {
        let mut mode = self.core.mode.poll(now);
        self.click_target = None;
        if mode == Mode::Dragging && self.press.is_none() {
            // The previous drag ended; a new gesture supersedes its settle
            self.core.mode.reset();
            mode = Mode::Idle;
        }

        if self.core.group.is_active() {
            self.press = if self.core.group.hit(point) {
                Some(Press::Group {
                    last: point,
                    moved: false,
                })
            } else {
                self.cell_at(point).map(|id| Press::Cell {
                    id,
                    start: point,
                    draggable: false,
                    moved: false,
                })
            };
            return;
        }

        if let Some(id) = self.cell_at(point) {
            self.press = Some(Press::Cell {
                id,
                start: point,
                draggable: true,
                moved: false,
            });
        } else if mode == Mode::Idle && self.core.mode.begin_drawing() {
            self.press = Some(Press::Canvas { start: point });
        }
    }

    pub fn pointer_move(&mut self, point: Point, now: Instant) {
        self.core.mode.poll(now);
        let Some(mut press) = self.press.take() else {
            return;
        };
        match &mut press {
            Press::Canvas { start } => {
                if self.core.mode.current() == Mode::Drawing {
                    self.core.preview = Some(Rect::from_corners(*start, point));
                }
            }
            Press::Cell {
                id,
                start,
                draggable: true,
                moved,
            } => {
                if *moved || point != *start {
                    if !*moved {
                        *moved = true;
                        self.with_cell(*id, |cell, core| cell.on_drag_start(core));
                    }
                    let (dx, dy) = point.delta_from(*start);
                    let canvas = self.canvas;
                    self.with_cell(*id, |cell, _| {
                        let rect = cell.rect();
                        cell.drag_to(rect.contain_origin(rect.origin().offset(dx, dy), canvas));
                    });
                }
            }
            Press::Cell { .. } => {}
            Press::Group { last, moved } => {
                if *moved || point != *last {
                    if !*moved {
                        *moved = true;
                        self.core.mode.begin_drag();
                        self.core.preview = None;
                    }
                    let (dx, dy) = point.delta_from(*last);
                    self.drag_group(dx, dy);
                    *last = point;
                }
            }
        }
        self.press = Some(press);
    }

    pub fn pointer_up(&mut self, point: Point, now: Instant) {
        self.core.mode.poll(now);
        self.core.preview = None;
        let Some(press) = self.press.take() else {
            return;
        };
        match press {
            Press::Canvas { start } => {
                if self.core.mode.finish_drawing() && start.x != point.x && start.y != point.y {
                    self.finish_drawing(Rect::from_corners(start, point));
                }
            }
            Press::Cell { id, moved, .. } => {
                if moved {
                    self.with_cell(id, |cell, core| cell.on_drag_stop(core));
                    self.core.mode.release_drag(now);
                }
                self.click_target = Some(id);
            }
            Press::Group { moved, .. } => {
                if moved {
                    self.core.mode.release_drag(now);
                }
            }
        }
    }

    /// The click that follows a pointer release.
    ///
    /// Outside every group rectangle it deselects the group, unless it is a
    /// select-click on a cell. A click only reaches a cell the press started on.
    pub fn click(&mut self, point: Point, now: Instant) {
        let target = self.click_target.take().filter(|id| {
            self.cell(*id)
                .and_then(Cell::rendered_rect)
                .is_some_and(|r| r.contains(point))
        });

        if self.core.group.is_active() {
            if self.core.group.hit(point) {
                return;
            }
            if !(target.is_some() && self.modifiers.select) {
                self.deselect_group();
            }
        }
        if let Some(id) = target {
            self.click_cell(id, now);
        }
    }

    /// Boxes of the current frame grown by `buffer`, for the search preview.
    pub fn buffered_boxes(&self, buffer: u32) -> Vec<Rect> {
        let canvas = self.canvas;
        self.core
            .store
            .frame(self.current_frame())
            .map(|labels| {
                labels
                    .keys()
                    .filter_map(|key| key.parse().ok())
                    .map(|rect| rect.buffered(buffer as i32, canvas))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Forget this frame's changes, as when the frame is re-entered going backward.
    pub fn clear_modified(&mut self) {
        self.core.modified.clear();
    }

    pub(crate) fn take_modified(&mut self) -> BTreeSet<CellKey> {
        std::mem::take(&mut self.core.modified)
    }

    pub(crate) fn replace_modified(&mut self, keys: BTreeSet<CellKey>) {
        self.core.modified = keys;
    }

    /// Write carried-over entries into another frame's map.
    pub(crate) fn seed_frame(&mut self, frame: &str, entries: Vec<(CellKey, String)>) {
        if entries.is_empty() {
            return;
        }
        for (key, label) in entries {
            self.core.store.insert(frame, key, &label);
        }
        self.core.publish();
    }

    fn finish_drawing(&mut self, rect: Rect) {
        if self.modifiers.select {
            if self.accept_box(&rect) {
                self.select_within(rect);
            }
        } else {
            let label = self.core.session.labels.first();
            self.create_cell(rect, label);
        }
    }

    /// Marquee selection: every cell fully inside `area` joins the group.
    fn select_within(&mut self, area: Rect) {
        let ids: Vec<CellId> = self
            .cells
            .iter()
            .filter(|c| area.encloses(&c.rect()))
            .map(Cell::id)
            .collect();
        if ids.is_empty() {
            return;
        }
        self.select_group(&ids);
        self.core.group.add_marquee(area);
    }

    fn accept_box(&mut self, rect: &Rect) -> bool {
        let threshold = self.core.session.settings.box_area_threshold;
        if rect.is_degenerate() || rect.area() < threshold {
            self.core.notify(Notice::TinyBox {
                area: rect.area(),
                threshold,
            });
            return false;
        }
        true
    }

    fn with_cell<R>(&mut self, id: CellId, f: impl FnOnce(&mut Cell, &mut CanvasCore) -> R) -> Option<R> {
        let cell = self.cells.iter_mut().find(|c| c.id() == id)?;
        let result = f(cell, &mut self.core);
        self.cells.retain(Cell::is_rendered);
        Some(result)
    }

    fn allocate_id(&mut self) -> CellId {
        self.next_id += 1;
        CellId(self.next_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::label::{Label, LabelRing};
    use crate::models::session::EngineSettings;
    use std::cell::RefCell;
    use std::time::Duration;

    fn session() -> Rc<AnnotationSession> {
        let labels = LabelRing::new(vec![
            Label::new("Animal", "#e74c3c", "Red"),
            Label::new("Human", "#3498db", "Blue"),
            Label::new("Vehicle", "#f1c40f", "Yellow"),
        ])
        .unwrap();
        Rc::new(AnnotationSession::new(labels, EngineSettings::default()))
    }

    fn controller() -> CanvasController {
        CanvasController::new(session(), CanvasSize::new(100, 100), FrameCursor::detached("f0"))
    }

    fn key(s: &str) -> CellKey {
        CellKey::from(s)
    }

    fn draw(ctl: &mut CanvasController, from: (i32, i32), to: (i32, i32), now: Instant) {
        ctl.pointer_down(Point::new(from.0, from.1), now);
        ctl.pointer_move(Point::new(to.0, to.1), now);
        ctl.pointer_up(Point::new(to.0, to.1), now);
        ctl.click(Point::new(to.0, to.1), now);
    }

    fn label_at(ctl: &CanvasController, k: &str) -> Option<String> {
        ctl.store().label_at("f0", &key(k)).map(str::to_string)
    }

    #[test]
    fn test_draw_creates_cell() {
        let mut ctl = controller();
        let t0 = Instant::now();
        ctl.pointer_down(Point::new(30, 30), t0);
        assert_eq!(ctl.mode(), Mode::Drawing);
        ctl.pointer_move(Point::new(10, 10), t0);
        assert_eq!(ctl.preview(), Some(Rect::new(10, 10, 20, 20)));
        ctl.pointer_up(Point::new(10, 10), t0);

        assert_eq!(ctl.mode(), Mode::Idle);
        assert_eq!(ctl.preview(), None);
        assert_eq!(label_at(&ctl, "10,10,20,20").as_deref(), Some("Animal"));
        assert_eq!(ctl.undo_len(), 1);
        assert!(ctl.modified_keys().contains(&key("10,10,20,20")));
    }

    #[test]
    fn test_tiny_box_leaves_store_unchanged() {
        let mut ctl = controller();
        let label = ctl.session().labels.first();
        ctl.create_cell(Rect::new(50, 50, 20, 20), label);
        let before = serde_json::to_string(ctl.store()).unwrap();

        assert!(ctl.create_cell(Rect::new(0, 0, 4, 4), label).is_none());
        assert!(ctl.create_cell(Rect::new(0, 0, 40, 0), label).is_none());

        assert_eq!(serde_json::to_string(ctl.store()).unwrap(), before);
        assert_eq!(ctl.undo_len(), 1);
        let notices = ctl.take_notices();
        assert_eq!(notices.len(), 2);
        assert!(matches!(notices[0], Notice::TinyBox { area: 16, threshold: 25 }));
    }

    #[test]
    fn test_zero_extent_drag_creates_nothing() {
        let mut ctl = controller();
        draw(&mut ctl, (10, 10), (40, 10), Instant::now());
        assert!(ctl.store().is_empty());
        assert!(ctl.take_notices().is_empty());
    }

    #[test]
    fn test_creations_then_undos_round_trip() {
        let mut ctl = controller();
        let label = ctl.session().labels.first();
        ctl.create_cell(Rect::new(0, 0, 50, 50), label);
        let before = ctl.store().clone();

        for i in 0..5 {
            ctl.create_cell(Rect::new(10 * i, 60, 10, 10), label);
        }
        for _ in 0..5 {
            assert!(ctl.undo(|| true));
        }
        assert_eq!(ctl.store(), &before);
    }

    #[test]
    fn test_undo_eviction_is_not_deletion() {
        let mut ctl = controller();
        let label = ctl.session().labels.first();
        for i in 0..11 {
            ctl.create_cell(Rect::new(i * 8, 0, 8, 8), label);
        }
        assert_eq!(ctl.undo_len(), 10);

        while ctl.undo(|| true) {}
        assert_eq!(ctl.store().cell_count(), 1);
        assert_eq!(label_at(&ctl, "0,0,8,8").as_deref(), Some("Animal"));
        assert_eq!(ctl.take_notices(), vec![Notice::NothingToUndo]);
    }

    #[test]
    fn test_undo_requires_confirmation() {
        let mut ctl = controller();
        let label = ctl.session().labels.first();
        ctl.create_cell(Rect::new(0, 0, 10, 10), label);
        assert!(!ctl.undo(|| false));
        assert_eq!(ctl.store().cell_count(), 1);
        assert_eq!(ctl.undo_len(), 1);
    }

    #[test]
    fn test_click_cycles_label_k_times() {
        let mut ctl = controller();
        let label = ctl.session().labels.first();
        let id = ctl.create_cell(Rect::new(10, 10, 20, 20), label).unwrap();
        let t0 = Instant::now();
        let names = ["Animal", "Human", "Vehicle"];
        for k in 1..=7 {
            ctl.pointer_down(Point::new(15, 15), t0);
            ctl.pointer_up(Point::new(15, 15), t0);
            ctl.click(Point::new(15, 15), t0);
            let expected = names[k % names.len()];
            assert_eq!(label_at(&ctl, "10,10,20,20").as_deref(), Some(expected));
        }
        assert_eq!(ctl.cell(id).and_then(Cell::label).map(|l| l.index()), Some(7 % 3));
        // Relabeling is not a placement
        assert_eq!(ctl.modified_keys().len(), 1);
    }

    #[test]
    fn test_move_is_delete_old_insert_new() {
        let mut ctl = controller();
        let label = ctl.session().labels.first();
        ctl.create_cell(Rect::new(10, 10, 20, 20), label);
        let t0 = Instant::now();

        ctl.pointer_down(Point::new(15, 15), t0);
        ctl.pointer_move(Point::new(25, 20), t0);
        assert_eq!(ctl.mode(), Mode::Dragging);
        ctl.pointer_move(Point::new(45, 35), t0);
        ctl.pointer_up(Point::new(45, 35), t0);

        assert!(label_at(&ctl, "10,10,20,20").is_none());
        assert_eq!(label_at(&ctl, "40,35,20,20").as_deref(), Some("Animal"));
        assert_eq!(ctl.modified_keys().iter().collect::<Vec<_>>(), vec![&key("40,35,20,20")]);

        // The click the browser fires after the drag does not relabel
        ctl.click(Point::new(45, 35), t0 + Duration::from_millis(10));
        assert_eq!(label_at(&ctl, "40,35,20,20").as_deref(), Some("Animal"));
        assert_eq!(ctl.poll_mode(t0 + Duration::from_millis(100)), Mode::Idle);
    }

    #[test]
    fn test_drag_is_contained_in_canvas() {
        let mut ctl = controller();
        let label = ctl.session().labels.first();
        ctl.create_cell(Rect::new(10, 10, 20, 20), label);
        let t0 = Instant::now();
        ctl.pointer_down(Point::new(15, 15), t0);
        ctl.pointer_move(Point::new(200, -50), t0);
        ctl.pointer_up(Point::new(200, -50), t0);
        assert_eq!(label_at(&ctl, "80,0,20,20").as_deref(), Some("Animal"));
    }

    #[test]
    fn test_delete_modifier_removes_cell() {
        let mut ctl = controller();
        let label = ctl.session().labels.first();
        ctl.create_cell(Rect::new(10, 10, 20, 20), label);
        ctl.set_modifiers(Modifiers { select: false, delete: true });
        let t0 = Instant::now();
        ctl.pointer_down(Point::new(15, 15), t0);
        ctl.pointer_up(Point::new(15, 15), t0);
        ctl.click(Point::new(15, 15), t0);

        assert!(ctl.store().is_empty());
        assert!(ctl.cells().is_empty());
        assert_eq!(ctl.undo_len(), 0);
        assert!(ctl.modified_keys().is_empty());
    }

    #[test]
    fn test_data_hook_sees_every_mutation() {
        let mut ctl = controller();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        ctl.set_data_update_hook(Box::new(move |store: &LabelStore| {
            sink.borrow_mut().push(store.cell_count());
        }));
        let label = ctl.session().labels.first();
        let id = ctl.create_cell(Rect::new(10, 10, 20, 20), label).unwrap();
        ctl.delete_cell(id);
        assert_eq!(*seen.borrow(), vec![1, 0]);
    }

    #[test]
    fn test_reload_rebuilds_cells_from_store() {
        let mut ctl = controller();
        let mut store = LabelStore::new();
        store.insert("f1", key("5,5,10,10"), "Human");
        store.insert("f1", key("30,30,10,10"), "Boat");
        store.insert("f1", key("7.6,5,10,10"), "Vehicle");
        ctl.load_data(store);

        ctl.reload_state(FrameCursor::detached("f1"));
        assert_eq!(ctl.cells().len(), 2);
        assert_eq!(ctl.undo_len(), 0);
        // Rebuilt cells still need carrying into the unvisited next frame
        let modified: Vec<&str> = ctl.modified_keys().iter().map(CellKey::as_str).collect();
        assert_eq!(modified, vec!["5,5,10,10", "8,5,10,10"]);
        assert_eq!(ctl.store().label_at("f1", &key("8,5,10,10")), Some("Vehicle"));
        assert!(ctl.store().label_at("f1", &key("7.6,5,10,10")).is_none());
        assert!(matches!(ctl.take_notices()[..], [Notice::UnknownLabel { .. }]));
    }

    #[test]
    fn test_group_drag_preserves_offsets() {
        let mut ctl = controller();
        let label = ctl.session().labels.first();
        let a = ctl.create_cell(Rect::new(10, 10, 10, 10), label).unwrap();
        let b = ctl.create_cell(Rect::new(20, 10, 10, 10), label).unwrap();
        let c = ctl.create_cell(Rect::new(15, 40, 10, 10), label).unwrap();
        ctl.select_group(&[a, b, c]);
        assert_eq!(ctl.group_wrapper(), Some(Rect::new(10, 10, 20, 40)));

        // a lands on b's old key; nothing may be lost
        assert_eq!(ctl.drag_group(10, 0), (10, 0));
        let keys: Vec<&str> = ctl.store().frame("f0").unwrap().keys().map(CellKey::as_str).collect();
        assert_eq!(keys, vec!["20,10,10,10", "25,40,10,10", "30,10,10,10"]);
        assert_eq!(ctl.group_wrapper(), Some(Rect::new(20, 10, 20, 40)));

        // Limited by the canvas edge
        assert_eq!(ctl.drag_group(500, 0), (60, 0));
    }

    #[test]
    fn test_group_pointer_drag_and_deselect() {
        let mut ctl = controller();
        let label = ctl.session().labels.first();
        let t0 = Instant::now();
        let a = ctl.create_cell(Rect::new(10, 10, 10, 10), label).unwrap();
        let b = ctl.create_cell(Rect::new(50, 50, 10, 10), label).unwrap();

        ctl.set_modifiers(Modifiers { select: true, delete: false });
        for p in [Point::new(15, 15), Point::new(55, 55)] {
            ctl.pointer_down(p, t0);
            ctl.pointer_up(p, t0);
            ctl.click(p, t0);
        }
        assert_eq!(ctl.group_members(), vec![a, b]);
        ctl.set_modifiers(Modifiers::default());

        // Pressing a member drags the whole group
        ctl.pointer_down(Point::new(15, 15), t0);
        ctl.pointer_move(Point::new(20, 17), t0);
        ctl.pointer_up(Point::new(20, 17), t0);
        ctl.click(Point::new(20, 17), t0);
        assert!(label_at(&ctl, "15,12,10,10").is_some());
        assert!(label_at(&ctl, "55,52,10,10").is_some());
        assert!(ctl.is_group_selected());

        // Empty canvas with a group active neither draws nor keeps the group
        let t1 = t0 + Duration::from_millis(200);
        ctl.pointer_down(Point::new(35, 35), t1);
        assert_eq!(ctl.mode(), Mode::Idle);
        ctl.pointer_up(Point::new(36, 36), t1);
        ctl.click(Point::new(36, 36), t1);
        assert!(!ctl.is_group_selected());
        assert!(ctl.cells().iter().all(|c| !c.is_selected()));
        assert_eq!(ctl.store().cell_count(), 2);
    }

    #[test]
    fn test_select_click_outside_group_extends_it() {
        let mut ctl = controller();
        let label = ctl.session().labels.first();
        let t0 = Instant::now();
        let a = ctl.create_cell(Rect::new(10, 10, 10, 10), label).unwrap();
        let b = ctl.create_cell(Rect::new(50, 50, 10, 10), label).unwrap();
        ctl.select_group(&[a]);

        ctl.set_modifiers(Modifiers { select: true, delete: false });
        ctl.pointer_down(Point::new(55, 55), t0);
        ctl.pointer_up(Point::new(55, 55), t0);
        ctl.click(Point::new(55, 55), t0);
        assert_eq!(ctl.group_members(), vec![a, b]);

        // A select-click inside the group keeps it intact
        ctl.pointer_down(Point::new(12, 12), t0);
        ctl.pointer_up(Point::new(12, 12), t0);
        ctl.click(Point::new(12, 12), t0);
        assert_eq!(ctl.group_members(), vec![a, b]);
    }

    #[test]
    fn test_marquee_selects_enclosed_cells() {
        let mut ctl = controller();
        let label = ctl.session().labels.first();
        let a = ctl.create_cell(Rect::new(10, 10, 10, 10), label).unwrap();
        let b = ctl.create_cell(Rect::new(30, 30, 10, 10), label).unwrap();
        ctl.create_cell(Rect::new(70, 70, 10, 10), label).unwrap();

        ctl.set_modifiers(Modifiers { select: true, delete: false });
        draw(&mut ctl, (5, 5), (45, 45), Instant::now());

        assert_eq!(ctl.group_members(), vec![a, b]);
        assert_eq!(ctl.store().cell_count(), 3);
    }

    #[test]
    fn test_deleting_member_leaves_group() {
        let mut ctl = controller();
        let label = ctl.session().labels.first();
        let a = ctl.create_cell(Rect::new(10, 10, 10, 10), label).unwrap();
        let b = ctl.create_cell(Rect::new(30, 30, 10, 10), label).unwrap();
        ctl.select_group(&[a, b]);
        ctl.delete_cell(a);
        assert_eq!(ctl.group_members(), vec![b]);
        assert_eq!(ctl.undo_len(), 1);
    }

    #[test]
    fn test_reload_skips_out_of_range_keys() {
        let mut ctl = controller();
        let mut store = LabelStore::new();
        store.insert("f1", key("3000000000,0,10,10"), "Human");
        store.insert("f1", key("5,5,10,10"), "Human");
        ctl.load_data(store);

        ctl.reload_state(FrameCursor::detached("f1"));
        assert_eq!(ctl.cells().len(), 1);
        assert!(ctl.cell_at(Point::new(6, 6)).is_some());
        assert!(matches!(ctl.take_notices()[..], [Notice::MalformedKey { .. }]));
    }

    #[test]
    fn test_group_snapshot_restores_on_reload() {
        let mut ctl = controller();
        let label = ctl.session().labels.first();
        let a = ctl.create_cell(Rect::new(10, 10, 10, 10), label).unwrap();
        ctl.create_cell(Rect::new(30, 30, 10, 10), label).unwrap();
        ctl.select_group(&[a]);

        let snapshot = ctl.group_snapshot();
        ctl.reload_state(FrameCursor::detached("f0"));
        assert!(!ctl.is_group_selected());

        ctl.restore_group(&snapshot);
        let members = ctl.group_members();
        assert_eq!(members.len(), 1);
        assert_eq!(ctl.cell(members[0]).map(Cell::rect), Some(Rect::new(10, 10, 10, 10)));
    }

    #[test]
    fn test_visited_next_frame_is_not_tracked() {
        let mut cursor = FrameCursor::detached("f0");
        cursor.next_visited = true;
        let mut ctl = CanvasController::new(session(), CanvasSize::new(100, 100), cursor);
        let label = ctl.session().labels.first();
        ctl.create_cell(Rect::new(10, 10, 20, 20), label);
        assert!(ctl.modified_keys().is_empty());
    }

    #[test]
    fn test_buffered_boxes() {
        let mut ctl = controller();
        let label = ctl.session().labels.first();
        ctl.create_cell(Rect::new(10, 10, 20, 20), label);
        assert_eq!(ctl.buffered_boxes(5), vec![Rect::new(5, 5, 30, 30)]);
    }
}
