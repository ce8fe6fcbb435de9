//! Delivery presentation
//!
//! Given a newly-arrived record, decide and execute its user-visible side
//! effects: always an in-app toast, plus an OS-level alert when the user has
//! already granted permission. Both delivery channels hand records here; the
//! id registry is what makes their overlap safe.

use dashmap::DashSet;
use pulse_model::{Notification, NotificationId, Severity};
use std::sync::Arc;
use std::time::Duration;

/// Host permission for OS-level notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    /// The user has not been asked yet
    Default,
    /// The user granted OS-level notifications
    Granted,
    /// The user declined; a terminal choice, respected silently
    Denied,
}

/// A transient in-app presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    /// Headline
    pub title: String,
    /// Body text
    pub body: String,
    /// Visual styling
    pub severity: Severity,
    /// `None` keeps the toast up until the user dismisses it
    pub auto_dismiss: Option<Duration>,
}

impl Toast {
    /// Whether this toast requires user interaction to go away.
    #[inline]
    #[must_use]
    pub fn is_sticky(&self) -> bool {
        self.auto_dismiss.is_none()
    }
}

/// An OS-level alert.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformAlert {
    /// Headline
    pub title: String,
    /// Body text
    pub body: String,
    /// De-duplication tag; the host replaces an existing alert carrying the
    /// same tag instead of stacking a second entry
    pub tag: String,
    /// Whether the alert requires interaction to dismiss
    pub sticky: bool,
}

/// Failure inside the host notification subsystem.
#[derive(Debug, thiserror::Error)]
#[error("platform notification failed: {0}")]
pub struct PlatformError(pub String);

/// In-app toast surface provided by the host UI.
///
/// Fire-and-forget: the host owns rendering and dismissal timing.
pub trait ToastSink: Send + Sync {
    /// Display a toast.
    fn toast(&self, toast: Toast);
}

/// Host platform notification capability.
///
/// Clicking an alert is expected to focus the application window and dismiss
/// the alert; the feed supplies only content and tag, never navigation.
#[cfg_attr(test, mockall::automock)]
pub trait PlatformNotifier: Send + Sync {
    /// Current permission state.
    fn permission(&self) -> PermissionState;

    /// Prompt the user for permission. Only the explicit opt-in flow calls
    /// this; delivery paths read [`Self::permission`] and nothing else.
    fn request_permission(&self) -> PermissionState;

    /// Show an alert.
    fn show(&self, alert: PlatformAlert) -> Result<(), PlatformError>;
}

/// The two materializing sweeps the polling checker runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepKind {
    /// Newly-overdue tasks
    OverdueTasks,
    /// Unread chat messages
    NewMessages,
}

impl SweepKind {
    /// Stable platform tag; repeats replace the OS entry instead of stacking.
    #[inline]
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::OverdueTasks => "sweep:overdue",
            Self::NewMessages => "sweep:messages",
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::OverdueTasks => "Overdue tasks",
            Self::NewMessages => "New messages",
        }
    }

    fn body(self, count: u64) -> String {
        let plural = if count == 1 { "" } else { "s" };
        match self {
            Self::OverdueTasks => format!("You have {count} overdue task{plural}!"),
            Self::NewMessages => format!("You have {count} new message{plural}!"),
        }
    }

    fn severity(self) -> Severity {
        match self {
            Self::OverdueTasks => Severity::Error,
            Self::NewMessages => Severity::Info,
        }
    }

    fn is_sticky(self) -> bool {
        matches!(self, Self::OverdueTasks)
    }
}

/// Executes the side effects for arriving records, at most once per id.
pub struct DeliveryPresenter {
    toasts: Arc<dyn ToastSink>,
    platform: Arc<dyn PlatformNotifier>,
    presented: DashSet<NotificationId>,
    toast_duration: Duration,
}

impl DeliveryPresenter {
    /// Create a presenter over the host capabilities.
    #[must_use]
    pub fn new(
        toasts: Arc<dyn ToastSink>,
        platform: Arc<dyn PlatformNotifier>,
        toast_duration: Duration,
    ) -> Self {
        Self {
            toasts,
            platform,
            presented: DashSet::new(),
            toast_duration,
        }
    }

    /// Present one record.
    ///
    /// The stream and the poll may both observe the same event, in either
    /// order; whichever lands here second finds the id claimed and stays
    /// silent.
    pub fn deliver(&self, record: &Notification) {
        if !self.presented.insert(record.id.clone()) {
            tracing::debug!(id = %record.id, "already presented, skipping");
            return;
        }

        let sticky = record.kind.is_sticky();
        self.toasts.toast(Toast {
            title: record.title.clone(),
            body: record.message.clone(),
            severity: record.kind.severity(),
            auto_dismiss: (!sticky).then_some(self.toast_duration),
        });

        self.platform_show(PlatformAlert {
            title: record.title.clone(),
            body: record.message.clone(),
            tag: format!("record:{}", record.id),
            sticky,
        });
    }

    /// Present a sweep aggregate ("You have N ...").
    ///
    /// Each positive sweep is fresh news, so aggregates are not
    /// id-deduplicated; only their platform tag is stable.
    pub fn deliver_aggregate(&self, sweep: SweepKind, count: u64) {
        let body = sweep.body(count);
        let sticky = sweep.is_sticky();

        self.toasts.toast(Toast {
            title: sweep.title().to_string(),
            body: body.clone(),
            severity: sweep.severity(),
            auto_dismiss: (!sticky).then_some(self.toast_duration),
        });

        self.platform_show(PlatformAlert {
            title: sweep.title().to_string(),
            body,
            tag: sweep.tag().to_string(),
            sticky,
        });
    }

    /// Explicit opt-in flow; prompts only when the user was never asked.
    pub fn request_permission(&self) -> PermissionState {
        match self.platform.permission() {
            PermissionState::Default => self.platform.request_permission(),
            state => state,
        }
    }

    fn platform_show(&self, alert: PlatformAlert) {
        match self.platform.permission() {
            PermissionState::Granted => {
                if let Err(err) = self.platform.show(alert) {
                    tracing::warn!("{err}");
                }
            }
            // Unasked or declined: the toast already fired as the fallback
            // channel, and delivery paths never prompt.
            PermissionState::Default | PermissionState::Denied => {}
        }
    }
}

impl std::fmt::Debug for DeliveryPresenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryPresenter")
            .field("presented", &self.presented.len())
            .field("toast_duration", &self.toast_duration)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use parking_lot::Mutex;
    use pulse_model::NotificationKind;

    #[derive(Default)]
    struct RecordedToasts {
        toasts: Mutex<Vec<Toast>>,
    }

    impl ToastSink for RecordedToasts {
        fn toast(&self, toast: Toast) {
            self.toasts.lock().push(toast);
        }
    }

    fn record(id: &str, kind: NotificationKind) -> Notification {
        Notification::new(id, kind, "title", "body", Utc::now())
    }

    fn presenter_with(
        platform: MockPlatformNotifier,
    ) -> (Arc<RecordedToasts>, DeliveryPresenter) {
        let toasts = Arc::new(RecordedToasts::default());
        let presenter = DeliveryPresenter::new(
            toasts.clone(),
            Arc::new(platform),
            Duration::from_secs(5),
        );
        (toasts, presenter)
    }

    #[test]
    fn same_id_presents_once() {
        let mut platform = MockPlatformNotifier::new();
        platform
            .expect_permission()
            .returning(|| PermissionState::Granted);
        platform.expect_show().times(1).returning(|_| Ok(()));

        let (toasts, presenter) = presenter_with(platform);
        let n = record("n-42", NotificationKind::TaskAssigned);

        presenter.deliver(&n);
        presenter.deliver(&n);

        assert_eq!(toasts.toasts.lock().len(), 1);
    }

    #[test]
    fn overdue_is_sticky_others_auto_dismiss() {
        let mut platform = MockPlatformNotifier::new();
        platform
            .expect_permission()
            .returning(|| PermissionState::Granted);
        platform
            .expect_show()
            .times(2)
            .returning(|_| Ok(()));

        let (toasts, presenter) = presenter_with(platform);
        presenter.deliver(&record("n-1", NotificationKind::TaskOverdue));
        presenter.deliver(&record("n-2", NotificationKind::TaskCompleted));

        let recorded = toasts.toasts.lock();
        assert!(recorded[0].is_sticky());
        assert_eq!(recorded[0].severity, Severity::Error);
        assert_eq!(recorded[1].auto_dismiss, Some(Duration::from_secs(5)));
        assert_eq!(recorded[1].severity, Severity::Success);
    }

    #[test]
    fn denied_permission_skips_platform_silently() {
        let mut platform = MockPlatformNotifier::new();
        platform
            .expect_permission()
            .returning(|| PermissionState::Denied);
        platform.expect_show().times(0);
        platform.expect_request_permission().times(0);

        let (toasts, presenter) = presenter_with(platform);
        presenter.deliver(&record("n-3", NotificationKind::TaskCompleted));

        // The toast is the fallback channel and still fires
        assert_eq!(toasts.toasts.lock().len(), 1);
    }

    #[test]
    fn platform_failure_is_swallowed() {
        let mut platform = MockPlatformNotifier::new();
        platform
            .expect_permission()
            .returning(|| PermissionState::Granted);
        platform
            .expect_show()
            .returning(|_| Err(PlatformError("subsystem unavailable".into())));

        let (toasts, presenter) = presenter_with(platform);
        presenter.deliver(&record("n-4", NotificationKind::ChatMessage));

        assert_eq!(toasts.toasts.lock().len(), 1);
    }

    #[test]
    fn aggregates_repeat_with_stable_tag() {
        let shown: Arc<Mutex<Vec<PlatformAlert>>> = Arc::default();
        let shown_clone = shown.clone();

        let mut platform = MockPlatformNotifier::new();
        platform
            .expect_permission()
            .returning(|| PermissionState::Granted);
        platform.expect_show().returning(move |alert| {
            shown_clone.lock().push(alert);
            Ok(())
        });

        let (toasts, presenter) = presenter_with(platform);
        presenter.deliver_aggregate(SweepKind::OverdueTasks, 3);
        presenter.deliver_aggregate(SweepKind::OverdueTasks, 1);

        assert_eq!(toasts.toasts.lock().len(), 2, "aggregates are not deduplicated");

        let shown = shown.lock();
        assert_eq!(shown.len(), 2);
        assert_eq!(shown[0].tag, "sweep:overdue");
        assert_eq!(shown[1].tag, "sweep:overdue");
        assert_eq!(shown[0].body, "You have 3 overdue tasks!");
        assert_eq!(shown[1].body, "You have 1 overdue task!");
    }

    #[test]
    fn record_and_sweep_tags_use_distinct_prefixes() {
        let shown: Arc<Mutex<Vec<PlatformAlert>>> = Arc::default();
        let shown_clone = shown.clone();

        let mut platform = MockPlatformNotifier::new();
        platform
            .expect_permission()
            .returning(|| PermissionState::Granted);
        platform.expect_show().returning(move |alert| {
            shown_clone.lock().push(alert);
            Ok(())
        });

        let (_toasts, presenter) = presenter_with(platform);
        presenter.deliver(&record("42", NotificationKind::TaskOverdue));
        presenter.deliver_aggregate(SweepKind::NewMessages, 2);

        let shown = shown.lock();
        assert_eq!(shown[0].tag, "record:42");
        assert_eq!(shown[1].tag, "sweep:messages");
    }

    #[test]
    fn opt_in_prompts_only_from_default() {
        let mut platform = MockPlatformNotifier::new();
        platform
            .expect_permission()
            .returning(|| PermissionState::Default);
        platform
            .expect_request_permission()
            .times(1)
            .returning(|| PermissionState::Granted);

        let (_toasts, presenter) = presenter_with(platform);
        assert_eq!(presenter.request_permission(), PermissionState::Granted);

        let mut denied = MockPlatformNotifier::new();
        denied
            .expect_permission()
            .returning(|| PermissionState::Denied);
        denied.expect_request_permission().times(0);

        let (_toasts, presenter) = presenter_with(denied);
        assert_eq!(presenter.request_permission(), PermissionState::Denied);
    }
}
