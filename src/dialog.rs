//! Client side of the contact flow: the modal dialog and its submission
//! state machine.
//!
//! `idle -> submitting -> success | error -> idle`. The return to `idle`
//! is driven by a reset task that is cancelled when the dialog is reopened
//! or dropped, so a reset scheduled for one opening never lands on the next.

mod scroll_lock;
mod submission_status;

pub use scroll_lock::{ScrollLock, ScrollLockGuard};
pub use submission_status::SubmissionStatus;

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use tokio::{sync::watch, task::AbortHandle};

use crate::domain::{ContactField, ContactForm};

#[derive(Clone, Copy, Debug)]
pub struct DialogTimings {
    /// 成功提示展示时长，之后关闭对话框
    pub success_display: Duration,
    /// 关闭动画期间保留表单内容
    pub close_grace: Duration,
    pub error_display: Duration,
    pub request_timeout: Duration,
}

impl Default for DialogTimings {
    fn default() -> Self {
        Self {
            success_display: Duration::from_secs(2),
            close_grace: Duration::from_millis(300),
            error_display: Duration::from_secs(3),
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejected {
    #[error("the contact dialog is closed.")]
    DialogClosed,
    #[error("name, email and message are required.")]
    IncompleteForm,
    #[error("a submission is already in flight.")]
    AlreadySubmitting,
    #[error("the message was already sent.")]
    AlreadySent,
}

pub struct DialogState {
    status: SubmissionStatus,
    form: ContactForm,
    scroll_guard: Option<ScrollLockGuard>,
    // 每次打开对话框加一，重置任务只作用于调度它的那一次打开
    generation: u64,
    pending_reset: Option<AbortHandle>,
}

impl DialogState {
    pub fn status(&self) -> SubmissionStatus {
        self.status
    }

    pub fn form(&self) -> &ContactForm {
        &self.form
    }

    pub fn is_open(&self) -> bool {
        self.scroll_guard.is_some()
    }

    /// Whether the submit control accepts a click.
    pub fn can_submit(&self) -> bool {
        self.is_open()
            && matches!(
                self.status,
                SubmissionStatus::Idle | SubmissionStatus::Error
            )
    }

    fn begin_submission(&mut self) -> Result<ContactForm, SubmitRejected> {
        if !self.is_open() {
            return Err(SubmitRejected::DialogClosed);
        }
        match self.status {
            SubmissionStatus::Submitting => return Err(SubmitRejected::AlreadySubmitting),
            SubmissionStatus::Success => return Err(SubmitRejected::AlreadySent),
            SubmissionStatus::Idle | SubmissionStatus::Error => {}
        }
        if !self.form.is_complete() {
            return Err(SubmitRejected::IncompleteForm);
        }

        // 错误提示期间重新提交，旧的重置任务作废
        self.cancel_pending_reset();
        self.status = SubmissionStatus::Submitting;
        Ok(self.form.clone())
    }

    fn cancel_pending_reset(&mut self) -> bool {
        match self.pending_reset.take() {
            Some(pending) => {
                pending.abort();
                true
            }
            None => false,
        }
    }

    /// Applies a cancelled reset right away.
    fn settle(&mut self) {
        match self.status {
            SubmissionStatus::Success => {
                self.status = SubmissionStatus::Idle;
                self.form.clear();
            }
            SubmissionStatus::Error => self.status = SubmissionStatus::Idle,
            SubmissionStatus::Idle | SubmissionStatus::Submitting => {}
        }
    }
}

pub struct ContactDialog {
    client: reqwest::Client,
    endpoint: reqwest::Url,
    scroll_lock: Arc<ScrollLock>,
    timings: DialogTimings,
    state: Arc<watch::Sender<DialogState>>,
}

impl ContactDialog {
    pub fn new(endpoint: reqwest::Url, scroll_lock: Arc<ScrollLock>) -> Self {
        let (state, _) = watch::channel(DialogState {
            status: SubmissionStatus::Idle,
            form: ContactForm::default(),
            scroll_guard: None,
            generation: 0,
            pending_reset: None,
        });

        Self {
            client: reqwest::Client::new(),
            endpoint,
            scroll_lock,
            timings: DialogTimings::default(),
            state: Arc::new(state),
        }
    }

    /// Dialog bound to the process-wide page scroll lock.
    pub fn for_page(endpoint: reqwest::Url) -> Self {
        Self::new(endpoint, ScrollLock::global())
    }

    pub fn with_timings(mut self, timings: DialogTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn status(&self) -> SubmissionStatus {
        self.state.borrow().status
    }

    pub fn form(&self) -> ContactForm {
        self.state.borrow().form.clone()
    }

    pub fn is_open(&self) -> bool {
        self.state.borrow().is_open()
    }

    pub fn is_submit_enabled(&self) -> bool {
        self.state.borrow().can_submit()
    }

    pub fn subscribe(&self) -> watch::Receiver<DialogState> {
        self.state.subscribe()
    }

    pub fn open(&self) {
        self.state.send_if_modified(|s| {
            if s.is_open() {
                return false;
            }
            s.generation = s.generation.wrapping_add(1);
            if s.cancel_pending_reset() {
                s.settle();
                tracing::debug!(status = s.status.as_str(), "pending reset settled on reopen.");
            }
            s.scroll_guard = Some(self.scroll_lock.acquire());
            true
        });
    }

    /// Closing never touches status or fields.
    pub fn close(&self) {
        self.state.send_if_modified(|s| s.scroll_guard.take().is_some());
    }

    pub fn set_field(&self, field: ContactField, value: impl Into<String>) {
        let value = value.into();
        self.state.send_modify(|s| s.form.set(field, value));
    }

    #[tracing::instrument(name = "提交联系表单", skip(self))]
    pub async fn submit(&self) -> Result<SubmissionStatus, SubmitRejected> {
        let mut begun = Err(SubmitRejected::DialogClosed);
        self.state.send_if_modified(|s| {
            begun = s.begin_submission();
            begun.is_ok()
        });
        let form = begun?;
        tracing::debug!(status = SubmissionStatus::Submitting.as_str(), "dialog status changed.");

        let status = match self.post(&form).await {
            Ok(()) => SubmissionStatus::Success,
            Err(e) => {
                tracing::warn!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "contact submission failed."
                );
                SubmissionStatus::Error
            }
        };
        self.finish(status);

        Ok(status)
    }

    async fn post(&self, form: &ContactForm) -> anyhow::Result<()> {
        self.client
            .post(self.endpoint.clone())
            .timeout(self.timings.request_timeout)
            .json(form)
            .send()
            .await
            .context("failed to reach the contact endpoint.")?
            .error_for_status()
            .context("contact endpoint rejected the submission.")?;

        Ok(())
    }

    fn finish(&self, status: SubmissionStatus) {
        let state = Arc::clone(&self.state);
        let timings = self.timings;
        self.state.send_modify(move |s| {
            s.status = status;
            let generation = s.generation;
            let task = match status {
                SubmissionStatus::Success => {
                    tokio::spawn(reset_after_success(state, generation, timings))
                }
                _ => tokio::spawn(reset_after_error(state, generation, timings)),
            };
            s.pending_reset = Some(task.abort_handle());
        });
        tracing::debug!(status = status.as_str(), "dialog status changed.");
    }
}

impl Drop for ContactDialog {
    fn drop(&mut self) {
        self.state.send_modify(|s| {
            s.cancel_pending_reset();
            s.scroll_guard = None;
        });
    }
}

async fn reset_after_success(
    state: Arc<watch::Sender<DialogState>>,
    generation: u64,
    timings: DialogTimings,
) {
    tokio::time::sleep(timings.success_display).await;
    let current = state.send_if_modified(|s| {
        if s.generation != generation {
            return false;
        }
        s.scroll_guard = None;
        true
    });
    if !current {
        return;
    }

    // 等关闭动画结束后再清空表单
    tokio::time::sleep(timings.close_grace).await;
    state.send_if_modified(|s| {
        if s.generation != generation {
            return false;
        }
        s.status = SubmissionStatus::Idle;
        s.form.clear();
        s.pending_reset = None;
        true
    });
}

async fn reset_after_error(
    state: Arc<watch::Sender<DialogState>>,
    generation: u64,
    timings: DialogTimings,
) {
    tokio::time::sleep(timings.error_display).await;
    state.send_if_modified(|s| {
        if s.generation != generation {
            return false;
        }
        s.status = SubmissionStatus::Idle;
        s.pending_reset = None;
        true
    });
}
