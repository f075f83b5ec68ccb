//! Add, update and remove dialogs of the visit page.
//!
//! Each dialog goes `Closed -> Initialized` when opened, `Initialized ->
//! Confirmed` while its request is in flight, and back to `Closed` once the
//! API accepts the change. A rejected request returns it to `Initialized`
//! with the error shown inline. Cancelling leaves it `Cancelled`, which is
//! closed as far as the host is concerned.

use reqwest::StatusCode;
use tracing::{info, warn};

use super::api::{ApiClient, ClientError, TokenSource};
use crate::models::{Visit, VisitRequest};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DialogState {
    #[default]
    Closed,
    Initialized,
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogOutcome {
    /// The change was accepted; the host should reload its data.
    Completed,
    /// The dialog stays open with an error message.
    Failed,
    /// Confirm was requested on a dialog that is not open.
    NotOpen,
}

/// State and messages shared by every dialog.
#[derive(Debug, Clone, Default)]
struct DialogCore {
    state: DialogState,
    message: String,
    error: Option<String>,
}

impl DialogCore {
    fn open(&mut self, message: String) {
        self.state = DialogState::Initialized;
        self.message = message;
        self.error = None;
    }

    fn begin_confirm(&mut self) -> bool {
        if self.state != DialogState::Initialized {
            return false;
        }
        self.state = DialogState::Confirmed;
        self.error = None;
        true
    }

    fn fail(&mut self, error: String) -> DialogOutcome {
        warn!("{error}");
        self.state = DialogState::Initialized;
        self.error = Some(error);
        DialogOutcome::Failed
    }

    fn complete(&mut self, message: String) -> DialogOutcome {
        info!("{message}");
        self.state = DialogState::Closed;
        self.message = message;
        DialogOutcome::Completed
    }

    fn cancel(&mut self) {
        if self.state == DialogState::Initialized {
            self.state = DialogState::Cancelled;
            self.error = None;
        }
    }

    /// Map the response of a write call to the dialog outcome.
    fn settle(
        &mut self,
        result: Result<reqwest::Response, ClientError>,
        expected: StatusCode,
        success: String,
        error_prefix: &str,
        exception_prefix: &str,
    ) -> DialogOutcome {
        match result {
            Ok(response) if response.status() == expected => self.complete(success),
            Ok(response) => self.fail(format!(
                "{error_prefix}: response status {}",
                response.status().as_u16()
            )),
            Err(e) => self.fail(format!("{exception_prefix}: {e}")),
        }
    }
}

fn all_set(request: &VisitRequest) -> bool {
    !request.user.is_empty() && !request.information.is_empty()
}

#[derive(Debug, Clone, Default)]
pub struct AddVisitDialog {
    core: DialogCore,
    fields: VisitRequest,
}

impl AddVisitDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self) {
        self.fields = VisitRequest::default();
        self.core.open(String::new());
    }

    pub fn state(&self) -> DialogState {
        self.core.state
    }

    pub fn message(&self) -> &str {
        &self.core.message
    }

    pub fn error(&self) -> Option<&str> {
        self.core.error.as_deref()
    }

    pub fn fields(&self) -> &VisitRequest {
        &self.fields
    }

    pub fn set_user(&mut self, user: impl Into<String>) {
        self.fields.user = user.into();
    }

    pub fn set_information(&mut self, information: impl Into<String>) {
        self.fields.information = information.into();
    }

    /// Confirm is offered once every mandatory field is filled.
    pub fn can_confirm(&self) -> bool {
        self.core.state == DialogState::Initialized && all_set(&self.fields)
    }

    pub async fn confirm<T: TokenSource>(&mut self, client: &ApiClient<T>) -> DialogOutcome {
        if !self.core.begin_confirm() {
            return DialogOutcome::NotOpen;
        }
        if !all_set(&self.fields) {
            return self
                .core
                .fail("Visit creation failed: not all mandatory fields are set".to_string());
        }

        let result = client.create_visit(&self.fields).await;
        self.core.settle(
            result,
            StatusCode::CREATED,
            format!("Visit: {} successfully added", self.fields.user),
            "Error while adding Visit",
            "Exception while adding Visit",
        )
    }

    pub fn cancel(&mut self) {
        self.core.cancel();
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateVisitDialog {
    core: DialogCore,
    selected: Option<Visit>,
    fields: VisitRequest,
}

impl UpdateVisitDialog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open on `selected`, pre-filling the editable fields from it.
    pub fn open(&mut self, selected: Visit) {
        self.fields = VisitRequest {
            user: selected.user.clone(),
            information: selected.information.clone(),
        };
        self.core
            .open(format!("Are you sure you want to update visit {}?", selected.id));
        self.selected = Some(selected);
    }

    pub fn state(&self) -> DialogState {
        self.core.state
    }

    pub fn message(&self) -> &str {
        &self.core.message
    }

    pub fn error(&self) -> Option<&str> {
        self.core.error.as_deref()
    }

    pub fn selected(&self) -> Option<&Visit> {
        self.selected.as_ref()
    }

    pub fn fields(&self) -> &VisitRequest {
        &self.fields
    }

    pub fn set_user(&mut self, user: impl Into<String>) {
        self.fields.user = user.into();
    }

    pub fn set_information(&mut self, information: impl Into<String>) {
        self.fields.information = information.into();
    }

    /// Confirm is offered once some mandatory field is filled and differs
    /// from the selected record.
    pub fn can_confirm(&self) -> bool {
        let Some(selected) = &self.selected else {
            return false;
        };
        let changed = |value: &str, original: &str| !value.is_empty() && value != original;

        self.core.state == DialogState::Initialized
            && (changed(&self.fields.user, &selected.user)
                || changed(&self.fields.information, &selected.information))
    }

    pub async fn confirm<T: TokenSource>(&mut self, client: &ApiClient<T>) -> DialogOutcome {
        let Some(id) = self.selected.as_ref().map(|visit| visit.id.clone()) else {
            return DialogOutcome::NotOpen;
        };
        if !self.core.begin_confirm() {
            return DialogOutcome::NotOpen;
        }
        if !all_set(&self.fields) {
            return self
                .core
                .fail("Visit update failed: not all mandatory fields are set".to_string());
        }

        let result = client.update_visit(&id, &self.fields).await;
        self.core.settle(
            result,
            StatusCode::OK,
            format!("Visit: {} successfully updated", self.fields.user),
            "Error while updating visit",
            "Exception while updating visit",
        )
    }

    pub fn cancel(&mut self) {
        self.core.cancel();
    }
}

#[derive(Debug, Clone, Default)]
pub struct RemoveVisitDialog {
    core: DialogCore,
    id: Option<String>,
}

impl RemoveVisitDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, id: impl Into<String>) {
        let id = id.into();
        self.core
            .open(format!("Are you sure you want to remove visit {id}?"));
        self.id = Some(id);
    }

    pub fn state(&self) -> DialogState {
        self.core.state
    }

    pub fn message(&self) -> &str {
        &self.core.message
    }

    pub fn error(&self) -> Option<&str> {
        self.core.error.as_deref()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn can_confirm(&self) -> bool {
        self.core.state == DialogState::Initialized
    }

    pub async fn confirm<T: TokenSource>(&mut self, client: &ApiClient<T>) -> DialogOutcome {
        let Some(id) = self.id.clone() else {
            return DialogOutcome::NotOpen;
        };
        if !self.core.begin_confirm() {
            return DialogOutcome::NotOpen;
        }

        let result = client.delete_visit(&id).await;
        self.core.settle(
            result,
            StatusCode::OK,
            format!("Visit: {id} successfully removed"),
            "Error while removing visit",
            "Exception while removing visit",
        )
    }

    pub fn cancel(&mut self) {
        self.core.cancel();
    }
}
