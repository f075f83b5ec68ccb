use reqwest::StatusCode;
use tracing::{debug, warn};

use super::api::{ApiClient, TokenSource};
use super::dialogs::{AddVisitDialog, DialogOutcome, RemoveVisitDialog, UpdateVisitDialog};
use super::table::VisitTable;
use crate::models::Visit;

/// The visit page: the table of all visits plus the three dialogs acting on
/// it. Completed dialogs reload the table.
pub struct VisitPage<T> {
    client: ApiClient<T>,
    table: VisitTable,
    message: String,
    error: Option<String>,
    add: AddVisitDialog,
    update: UpdateVisitDialog,
    remove: RemoveVisitDialog,
}

impl<T: TokenSource> VisitPage<T> {
    pub fn new(client: ApiClient<T>) -> Self {
        Self {
            client,
            table: VisitTable::default(),
            message: String::new(),
            error: None,
            add: AddVisitDialog::new(),
            update: UpdateVisitDialog::new(),
            remove: RemoveVisitDialog::new(),
        }
    }

    pub fn client(&self) -> &ApiClient<T> {
        &self.client
    }

    pub fn table(&self) -> &VisitTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut VisitTable {
        &mut self.table
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Fetch every visit. A 404 is read as "no visits yet".
    pub async fn load(&mut self) {
        self.error = None;

        let response = match self.client.get_visits().await {
            Ok(response) => response,
            Err(e) => {
                self.fail(format!("Exception while loading visits: {e}"));
                return;
            }
        };

        match response.status() {
            StatusCode::OK => match response.json::<Vec<Visit>>().await {
                Ok(visits) => self.show(visits),
                Err(e) => self.fail(format!("Exception while loading visits: {e}")),
            },
            StatusCode::NOT_FOUND => self.show(Vec::new()),
            status => self.fail(format!(
                "Error while loading visits: response status {}",
                status.as_u16()
            )),
        }
    }

    fn show(&mut self, visits: Vec<Visit>) {
        self.table.fill(visits);
        self.message = format!("{} record(s) in Visit table", self.table.len());
        debug!("{}", self.message);
    }

    fn fail(&mut self, error: String) {
        warn!("{error}");
        self.message.clear();
        self.error = Some(error);
    }

    pub fn add_dialog(&mut self) -> &mut AddVisitDialog {
        &mut self.add
    }

    pub fn update_dialog(&mut self) -> &mut UpdateVisitDialog {
        &mut self.update
    }

    pub fn remove_dialog(&mut self) -> &mut RemoveVisitDialog {
        &mut self.remove
    }

    pub fn open_add(&mut self) -> &mut AddVisitDialog {
        self.add.open();
        &mut self.add
    }

    /// Opens on the selected row; `None` when nothing is selected.
    pub fn open_update(&mut self) -> Option<&mut UpdateVisitDialog> {
        let selected = self.table.selected()?.clone();
        self.update.open(selected);
        Some(&mut self.update)
    }

    /// Opens on the selected row; `None` when nothing is selected.
    pub fn open_remove(&mut self) -> Option<&mut RemoveVisitDialog> {
        let id = self.table.selected()?.id.clone();
        self.remove.open(id);
        Some(&mut self.remove)
    }

    pub async fn confirm_add(&mut self) -> DialogOutcome {
        let outcome = self.add.confirm(&self.client).await;
        self.after_dialog(outcome).await
    }

    pub async fn confirm_update(&mut self) -> DialogOutcome {
        let outcome = self.update.confirm(&self.client).await;
        self.after_dialog(outcome).await
    }

    pub async fn confirm_remove(&mut self) -> DialogOutcome {
        let outcome = self.remove.confirm(&self.client).await;
        self.after_dialog(outcome).await
    }

    async fn after_dialog(&mut self, outcome: DialogOutcome) -> DialogOutcome {
        if outcome == DialogOutcome::Completed {
            self.load().await;
        }
        outcome
    }
}
