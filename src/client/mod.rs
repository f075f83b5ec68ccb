//! Front-end side of the visit application: a REST client for the visit API
//! and the view-models of the visit page (table and add/update/remove
//! dialogs). Rendering is left to the embedding UI.

pub mod api;
pub mod dialogs;
pub mod page;
pub mod table;

pub use api::{ApiClient, ClientError, NoToken, StaticToken, TokenSource};
pub use dialogs::{AddVisitDialog, DialogOutcome, DialogState, RemoveVisitDialog, UpdateVisitDialog};
pub use page::VisitPage;
pub use table::{Column, SortOrder, VisitTable};
