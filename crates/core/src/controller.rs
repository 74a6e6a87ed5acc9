//! The merge viewer controller.
//!
//! [`MergeViewerController`] owns the three content slots of a viewer and the
//! dirty flags of its two editable sides. It sits between a
//! [`ContentProvider`], a [`Container`] and a [`Renderer`], and guarantees that
//! pending edits are resolved (saved, discarded, or the switch cancelled)
//! before the bound input changes.
//!
//! All entry points take `&mut self`: the controller lives on one thread and
//! a resolution prompt can never be re-entered for the same viewer.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{SavePolicy, ViewerConfig};
use crate::confirm::{Confirmer, PromptKind, SaveDecision, SavePrompt};
use crate::container::Container;
use crate::errors::{ConfigError, PersistenceError, ViewerError};
use crate::input::CompareInput;
use crate::listeners::{ListenerList, ViewerEvent, ViewerListener};
use crate::notify::{LogNotifier, Notifier};
use crate::provider::{ContentProvider, MirroredContentProvider};
use crate::renderer::Renderer;
use crate::side::{CopyDirection, Pane, Side};

/// Result of an operation that may replace what the viewer shows.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The switch happened.
    Switched,
    /// Nothing to do: the requested state was already current.
    Unchanged,
    /// The user declined to resolve pending edits. Nothing changed.
    Cancelled,
}

impl SwitchOutcome {
    pub fn is_cancelled(self) -> bool {
        self == Self::Cancelled
    }
}

/// How pending edits were dealt with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Clean,
    Saved,
    Discarded,
    Cancelled,
}

/// Mediates input transitions, dirty tracking and flushing for one viewer.
pub struct MergeViewerController<I, R> {
    config: ViewerConfig,
    base_provider: Arc<dyn ContentProvider<I>>,
    provider: Arc<dyn ContentProvider<I>>,
    container: Arc<dyn Container<I>>,
    renderer: R,
    confirmer: Box<dyn Confirmer>,
    notifier: Box<dyn Notifier>,
    listeners: ListenerList<dyn Fn(&ViewerEvent) + Send + Sync>,

    input: Option<Arc<I>>,
    left_dirty: bool,
    right_dirty: bool,
    three_way: bool,
    ancestor_visible: bool,
    ancestor_toggle_enabled: bool,
    mirrored: bool,
    /// Indexed by `copy_index`.
    copy_enabled: [bool; 2],
}

impl<I, R> MergeViewerController<I, R>
where
    I: CompareInput + 'static,
    R: Renderer,
{
    /// Create a controller with no bound input.
    ///
    /// The configuration is validated here; an invalid configuration is fatal.
    pub fn new(
        config: ViewerConfig,
        provider: Arc<dyn ContentProvider<I>>,
        container: Arc<dyn Container<I>>,
        renderer: R,
        confirmer: Box<dyn Confirmer>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mirrored = config.viewer.mirrored;
        let ancestor_visible = config.viewer.ancestor_visible;
        let ancestor_toggle_enabled = !config.viewer.ignore_ancestor;
        info!(
            policy = %config.viewer.save_policy,
            mirrored,
            ancestor_visible,
            "creating merge viewer controller"
        );

        let active = Self::provider_for(&provider, mirrored);
        Ok(Self {
            config,
            base_provider: provider,
            provider: active,
            container,
            renderer,
            confirmer,
            notifier: Box::new(LogNotifier),
            listeners: ListenerList::new(),
            input: None,
            left_dirty: false,
            right_dirty: false,
            three_way: false,
            ancestor_visible,
            ancestor_toggle_enabled,
            mirrored,
            copy_enabled: [false, false],
        })
    }

    /// Replace the default log-only notifier.
    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    fn provider_for(
        base: &Arc<dyn ContentProvider<I>>,
        mirrored: bool,
    ) -> Arc<dyn ContentProvider<I>> {
        if mirrored {
            Arc::new(MirroredContentProvider::new(base.clone()))
        } else {
            base.clone()
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn input(&self) -> Option<&Arc<I>> {
        self.input.as_ref()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn is_left_dirty(&self) -> bool {
        self.left_dirty
    }

    pub fn is_right_dirty(&self) -> bool {
        self.right_dirty
    }

    pub fn is_side_dirty(&self, side: Side) -> bool {
        match side {
            Side::Left => self.left_dirty,
            Side::Right => self.right_dirty,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.left_dirty || self.right_dirty
    }

    pub fn is_three_way(&self) -> bool {
        self.three_way
    }

    pub fn is_ancestor_visible(&self) -> bool {
        self.ancestor_visible
    }

    pub fn is_ancestor_toggle_enabled(&self) -> bool {
        self.ancestor_toggle_enabled
    }

    pub fn is_mirrored(&self) -> bool {
        self.mirrored
    }

    pub fn is_copy_enabled(&self, direction: CopyDirection) -> bool {
        self.copy_enabled[copy_index(direction)]
    }

    // -----------------------------------------------------------------------
    // Listeners
    // -----------------------------------------------------------------------

    /// Register a listener. Registering the same handle twice is a no-op.
    pub fn add_listener(&mut self, listener: ViewerListener) {
        self.listeners.add(listener);
    }

    pub fn remove_listener(&mut self, listener: &ViewerListener) {
        self.listeners.remove(listener);
    }

    fn fire(&self, event: ViewerEvent) {
        self.listeners.fire(&event);
    }

    // -----------------------------------------------------------------------
    // Input binding
    // -----------------------------------------------------------------------

    /// Bind a new input (or none).
    ///
    /// Pending edits against the previous input are resolved first according
    /// to the save policy. If the user cancels, nothing changes and
    /// [`SwitchOutcome::Cancelled`] is returned. If saving fails, the error is
    /// returned and the previous input stays bound with its edits pending.
    pub fn bind(&mut self, new_input: Option<Arc<I>>) -> Result<SwitchOutcome, ViewerError> {
        if same_input(self.input.as_ref(), new_input.as_ref()) {
            return Ok(SwitchOutcome::Unchanged);
        }

        if let Some(old) = self.input.clone() {
            if self.resolve_pending(&old, PromptKind::InputSwitch)? == Resolution::Cancelled {
                info!(input = %old.name(), "input switch cancelled");
                return Ok(SwitchOutcome::Cancelled);
            }
            self.provider.unwatch_labels(&old);
            self.container.remove_input_change_listener(&old);
        }

        // Edits recorded without a bound input have nowhere to go.
        self.set_dirty(Side::Left, false);
        self.set_dirty(Side::Right, false);

        if let Some(new) = &new_input {
            self.container.add_input_change_listener(new);
            self.provider.watch_labels(new);
            info!(input = %new.name(), "input bound");
        } else {
            info!("input cleared");
        }
        self.input = new_input;

        self.refresh();
        Ok(SwitchOutcome::Switched)
    }

    /// Resolve pending edits against `input` using the configured policy.
    fn resolve_pending(
        &mut self,
        input: &Arc<I>,
        kind: PromptKind,
    ) -> Result<Resolution, ViewerError> {
        if !self.is_dirty() {
            return Ok(Resolution::Clean);
        }

        let policy = self.config.viewer.save_policy;
        let decision = match policy {
            SavePolicy::SilentFlush | SavePolicy::AlwaysFlush => SaveDecision::Save,
            SavePolicy::Confirm => {
                let messages = &self.config.messages;
                let (title, message) = match kind {
                    PromptKind::InputSwitch => (&messages.save_title, &messages.save_message),
                    PromptKind::ExternalChange => (
                        &messages.resource_changed_title,
                        &messages.resource_changed_message,
                    ),
                };
                let prompt = SavePrompt {
                    kind,
                    title,
                    message,
                    input_name: input.name(),
                    left_dirty: self.left_dirty,
                    right_dirty: self.right_dirty,
                };
                self.confirmer.confirm(&prompt)
            }
        };
        debug!(%policy, ?kind, ?decision, "pending edits");

        match decision {
            SaveDecision::Save => {
                self.flush_content(input)?;
                self.set_dirty(Side::Left, false);
                self.set_dirty(Side::Right, false);
                Ok(Resolution::Saved)
            }
            SaveDecision::Discard => {
                info!(input = %input.name(), "discarding pending edits");
                self.set_dirty(Side::Left, false);
                self.set_dirty(Side::Right, false);
                Ok(Resolution::Discarded)
            }
            SaveDecision::Cancel => Ok(Resolution::Cancelled),
        }
    }

    /// Handle an out-of-band change of the bound input.
    ///
    /// Does nothing while the container is saving. Otherwise pending edits are
    /// resolved (a cancel answer drops them, since the underlying input has
    /// already moved on) and the viewer is refreshed.
    pub fn handle_external_change_notification(&mut self) -> Result<(), ViewerError> {
        let Some(input) = self.input.clone() else {
            return Ok(());
        };

        if self.container.is_saving() {
            debug!(input = %input.name(), "save in progress, ignoring change notification");
            return Ok(());
        }

        if self.resolve_pending(&input, PromptKind::ExternalChange)? == Resolution::Cancelled {
            self.set_dirty(Side::Left, false);
            self.set_dirty(Side::Right, false);
        }

        self.refresh();
        Ok(())
    }

    /// Container callback: `input` reported a change.
    pub fn on_input_changed(&mut self, input: &Arc<I>) -> Result<(), ViewerError> {
        if same_input(self.input.as_ref(), Some(input)) {
            self.handle_external_change_notification()
        } else {
            Ok(())
        }
    }

    /// Label-provider callback: labels of `elements` changed.
    pub fn on_labels_changed(&mut self, elements: &[Arc<I>]) {
        if let Some(input) = self.input.clone() {
            if elements.iter().any(|e| Arc::ptr_eq(e, &input)) {
                self.update_header(&input);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Dirty state
    // -----------------------------------------------------------------------

    /// Set a side's dirty flag, notifying listeners if it changed.
    pub fn set_dirty(&mut self, side: Side, dirty: bool) {
        let slot = match side {
            Side::Left => &mut self.left_dirty,
            Side::Right => &mut self.right_dirty,
        };
        if *slot != dirty {
            *slot = dirty;
            debug!(%side, dirty, "dirty state changed");
            self.fire(ViewerEvent::DirtyState(dirty));
        }
    }

    /// Replace a side's bytes in the renderer and mark it dirty.
    pub fn apply_edit(&mut self, side: Side, bytes: Vec<u8>) {
        self.renderer.set_contents(side, bytes);
        self.set_dirty(side, true);
    }

    /// Copy one side's current bytes over the other.
    ///
    /// Returns `false` when there is no input or the target is read-only.
    pub fn copy(&mut self, direction: CopyDirection) -> bool {
        let Some(input) = self.input.clone() else {
            return false;
        };
        let target = direction.target();
        if !self.provider.is_editable(target, &input) {
            debug!(%target, "copy target is read-only");
            return false;
        }

        let bytes = self
            .renderer
            .contents(direction.source())
            .unwrap_or_default();
        self.renderer.set_contents(target, bytes);
        self.set_dirty(target, true);
        true
    }

    // -----------------------------------------------------------------------
    // Flushing
    // -----------------------------------------------------------------------

    /// Persist one side of the bound input if it is editable and dirty.
    pub fn flush(&mut self, side: Side) -> Result<(), ViewerError> {
        let Some(input) = self.input.clone() else {
            return Ok(());
        };
        self.flush_side(&input, side)?;
        Ok(())
    }

    /// Persist both sides. Both are attempted; the first failure is returned.
    pub fn flush_all(&mut self) -> Result<(), ViewerError> {
        let Some(input) = self.input.clone() else {
            return Ok(());
        };
        self.flush_content(&input)?;
        Ok(())
    }

    fn flush_content(&mut self, input: &Arc<I>) -> Result<(), PersistenceError> {
        let left = self.flush_side(input, Side::Left);
        let right = self.flush_side(input, Side::Right);
        left.and(right)
    }

    fn flush_side(&mut self, input: &Arc<I>, side: Side) -> Result<(), PersistenceError> {
        let opposite_empty = self
            .provider
            .content(side.opposite().into(), input)
            .is_none();

        if !(self.provider.is_editable(side, input) && self.is_side_dirty(side)) {
            return Ok(());
        }

        let mut bytes = self.renderer.contents(side);
        // Mirroring an absent side must not create an empty file.
        if opposite_empty && bytes.as_ref().is_some_and(|b| b.is_empty()) {
            bytes = None;
        }

        match self.provider.save_content(side, input, bytes.as_deref()) {
            Ok(()) => {
                info!(
                    input = %input.name(),
                    %side,
                    len = bytes.as_ref().map_or(0, |b| b.len()),
                    "side flushed"
                );
                self.set_dirty(side, false);
                Ok(())
            }
            Err(e) => {
                warn!(input = %input.name(), %side, error = %e, "flush failed");
                self.notifier.persistence_failed(&input.name(), side, &e);
                Err(e)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Refresh
    // -----------------------------------------------------------------------

    /// Re-read content, headers and toolbar state for the bound input.
    pub fn refresh(&mut self) {
        let Some(input) = self.input.clone() else {
            self.update_three_way(false);
            self.renderer.update_content(None, None, None);
            self.update_tool_items();
            return;
        };

        let ancestor = self.provider.content(Pane::Ancestor, &input);
        let three_way = if input.is_hunk() {
            true
        } else if let Some(kind) = input.kind() {
            kind.is_three_way()
        } else {
            ancestor.is_some()
        };
        self.update_three_way(three_way);

        let left = self.provider.content(Pane::Left, &input);
        let right = self.provider.content(Pane::Right, &input);
        self.renderer
            .update_content(ancestor.as_deref(), left.as_deref(), right.as_deref());

        self.update_header(&input);
        self.update_tool_items();
    }

    fn update_three_way(&mut self, three_way: bool) {
        let old = self.three_way;
        self.three_way = three_way;
        self.renderer.set_ancestor_available(three_way);

        if old != three_way {
            debug!(three_way, "three-way state changed");
            self.fire(ViewerEvent::ThreeWay(three_way));
            if self.ancestor_visible {
                self.renderer.relayout();
            }
        }
    }

    fn update_header(&mut self, input: &Arc<I>) {
        for pane in [Pane::Ancestor, Pane::Left, Pane::Right] {
            let header = self.provider.header(pane, input);
            if header.label.is_some() || header.image.is_some() {
                self.renderer.update_header(pane, &header);
            }
        }
    }

    fn update_tool_items(&mut self) {
        let (left_to_right, right_to_left) = match &self.input {
            Some(input) => (
                self.provider.is_editable(Side::Right, input),
                self.provider.is_editable(Side::Left, input),
            ),
            None => (false, false),
        };
        self.set_copy_enabled(CopyDirection::LeftToRight, left_to_right);
        self.set_copy_enabled(CopyDirection::RightToLeft, right_to_left);
    }

    fn set_copy_enabled(&mut self, direction: CopyDirection, enabled: bool) {
        self.renderer.set_copy_enabled(direction, enabled);
        let slot = &mut self.copy_enabled[copy_index(direction)];
        if *slot != enabled {
            *slot = enabled;
            self.fire(ViewerEvent::CopyEnabled { direction, enabled });
        }
    }

    // -----------------------------------------------------------------------
    // Presentation settings
    // -----------------------------------------------------------------------

    /// Swap which model is shown on which side.
    ///
    /// Pending edits are resolved first, so dirty flags never have to follow
    /// the swap. A cancel answer leaves the viewer as it was.
    pub fn set_mirrored(&mut self, mirrored: bool) -> Result<SwitchOutcome, ViewerError> {
        if self.mirrored == mirrored {
            return Ok(SwitchOutcome::Unchanged);
        }

        if let Some(input) = self.input.clone() {
            if self.resolve_pending(&input, PromptKind::InputSwitch)? == Resolution::Cancelled {
                info!(input = %input.name(), "mirror switch cancelled");
                return Ok(SwitchOutcome::Cancelled);
            }
        }

        self.mirrored = mirrored;
        self.provider = Self::provider_for(&self.base_provider, mirrored);
        info!(mirrored, "content provider swapped");

        self.refresh();
        Ok(SwitchOutcome::Switched)
    }

    /// Show or hide the ancestor pane. Returns whether anything changed.
    pub fn set_ancestor_visible(&mut self, visible: bool) -> bool {
        if visible && !self.ancestor_toggle_enabled {
            debug!("ancestor pane is locked hidden");
            return false;
        }
        if self.ancestor_visible == visible {
            return false;
        }

        self.ancestor_visible = visible;
        self.fire(ViewerEvent::AncestorVisible(visible));
        if self.three_way {
            self.renderer.relayout();
        }
        true
    }

    /// Ignore the ancestor: hide the pane and lock the toggle.
    pub fn set_ignore_ancestor(&mut self, ignore: bool) {
        if ignore {
            self.set_ancestor_visible(false);
        }
        self.ancestor_toggle_enabled = !ignore;
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// Detach from the bound input and drop every listener.
    ///
    /// Pending edits are not saved.
    pub fn dispose(&mut self) {
        if let Some(input) = self.input.take() {
            self.provider.unwatch_labels(&input);
            self.container.remove_input_change_listener(&input);
            debug!(input = %input.name(), "controller disposed");
        }
        self.listeners.clear();
    }
}

fn same_input<I>(a: Option<&Arc<I>>, b: Option<&Arc<I>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

fn copy_index(direction: CopyDirection) -> usize {
    match direction {
        CopyDirection::LeftToRight => 0,
        CopyDirection::RightToLeft => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::confirm::FixedDecision;
    use crate::container::WatchRegistry;
    use crate::input::DiffKind;
    use crate::renderer::BufferRenderer;

    /// A non-structured input: no change kind, optional ancestor.
    struct Document {
        ancestor: Option<&'static str>,
        left: Option<&'static str>,
        right: Option<&'static str>,
    }

    impl CompareInput for Document {
        fn kind(&self) -> Option<DiffKind> {
            None
        }

        fn name(&self) -> String {
            "document".into()
        }
    }

    #[derive(Default)]
    struct DocumentProvider {
        saved: Mutex<Vec<(Side, Option<Vec<u8>>)>>,
    }

    impl ContentProvider<Document> for DocumentProvider {
        fn content(&self, pane: Pane, input: &Document) -> Option<Vec<u8>> {
            let text = match pane {
                Pane::Ancestor => input.ancestor,
                Pane::Left => input.left,
                Pane::Right => input.right,
            };
            text.map(|t| t.as_bytes().to_vec())
        }

        fn label(&self, _pane: Pane, _input: &Document) -> Option<String> {
            None
        }

        fn is_editable(&self, _side: Side, _input: &Document) -> bool {
            true
        }

        fn save_content(
            &self,
            side: Side,
            _input: &Document,
            bytes: Option<&[u8]>,
        ) -> Result<(), PersistenceError> {
            self.saved
                .lock()
                .unwrap()
                .push((side, bytes.map(<[u8]>::to_vec)));
            Ok(())
        }
    }

    fn controller(
        provider: Arc<DocumentProvider>,
    ) -> MergeViewerController<Document, BufferRenderer> {
        MergeViewerController::new(
            ViewerConfig::default(),
            provider,
            Arc::new(WatchRegistry::<Document>::new()),
            BufferRenderer::default(),
            Box::new(FixedDecision(SaveDecision::Save)),
        )
        .unwrap()
    }

    fn doc(ancestor: Option<&'static str>) -> Arc<Document> {
        Arc::new(Document {
            ancestor,
            left: Some("left"),
            right: Some("right"),
        })
    }

    #[test]
    fn test_set_dirty_fires_once_per_transition() {
        let mut c = controller(Arc::new(DocumentProvider::default()));
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        c.add_listener(Arc::new(move |e: &ViewerEvent| {
            if let ViewerEvent::DirtyState(v) = e {
                sink.lock().unwrap().push(*v);
            }
        }));

        c.set_dirty(Side::Left, false);
        c.set_dirty(Side::Left, true);
        c.set_dirty(Side::Left, true);
        c.set_dirty(Side::Right, true);
        c.set_dirty(Side::Left, false);
        c.set_dirty(Side::Right, false);
        c.set_dirty(Side::Right, false);

        assert_eq!(*events.lock().unwrap(), vec![true, true, false, false]);
    }

    #[test]
    fn test_three_way_from_ancestor_presence() {
        let mut c = controller(Arc::new(DocumentProvider::default()));
        let _ = c.bind(Some(doc(Some("base")))).unwrap();
        assert!(c.is_three_way());

        let _ = c.bind(Some(doc(None))).unwrap();
        assert!(!c.is_three_way());
    }

    #[test]
    fn test_flush_normalizes_empty_when_opposite_absent() {
        let provider = Arc::new(DocumentProvider::default());
        let mut c = controller(provider.clone());
        let input = Arc::new(Document {
            ancestor: None,
            left: Some("old"),
            right: None,
        });
        let _ = c.bind(Some(input)).unwrap();

        c.apply_edit(Side::Left, Vec::new());
        c.flush(Side::Left).unwrap();

        assert!(!c.is_left_dirty());
        assert_eq!(*provider.saved.lock().unwrap(), vec![(Side::Left, None)]);
    }

    #[test]
    fn test_flush_keeps_empty_when_opposite_present() {
        let provider = Arc::new(DocumentProvider::default());
        let mut c = controller(provider.clone());
        let _ = c.bind(Some(doc(None))).unwrap();

        c.apply_edit(Side::Left, Vec::new());
        c.flush(Side::Left).unwrap();

        assert_eq!(
            *provider.saved.lock().unwrap(),
            vec![(Side::Left, Some(Vec::new()))]
        );
    }

    #[test]
    fn test_flush_skips_clean_side() {
        let provider = Arc::new(DocumentProvider::default());
        let mut c = controller(provider.clone());
        let _ = c.bind(Some(doc(None))).unwrap();

        c.flush(Side::Right).unwrap();
        assert!(provider.saved.lock().unwrap().is_empty());
    }

    #[test]
    fn test_rebinding_same_input_is_unchanged() {
        let mut c = controller(Arc::new(DocumentProvider::default()));
        let input = doc(None);
        assert_eq!(c.bind(Some(input.clone())).unwrap(), SwitchOutcome::Switched);
        c.set_dirty(Side::Left, true);
        assert_eq!(c.bind(Some(input)).unwrap(), SwitchOutcome::Unchanged);
        assert!(c.is_left_dirty());
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let mut config = ViewerConfig::default();
        config.viewer.ignore_ancestor = true;
        config.viewer.ancestor_visible = true;
        let result = MergeViewerController::<Document, _>::new(
            config,
            Arc::new(DocumentProvider::default()),
            Arc::new(WatchRegistry::<Document>::new()),
            BufferRenderer::default(),
            Box::new(FixedDecision(SaveDecision::Save)),
        );
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
