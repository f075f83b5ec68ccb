use std::cmp::Ordering;

use crate::models::Visit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Id,
    User,
    Information,
    CreationDate,
    LocalIp,
    LocalPort,
    RemoteIp,
    RemotePort,
}

impl Column {
    pub const ALL: [Column; 8] = [
        Column::Id,
        Column::User,
        Column::Information,
        Column::CreationDate,
        Column::LocalIp,
        Column::LocalPort,
        Column::RemoteIp,
        Column::RemotePort,
    ];

    /// JSON field name of the column.
    pub fn field(self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::User => "user",
            Column::Information => "information",
            Column::CreationDate => "creationDate",
            Column::LocalIp => "localIp",
            Column::LocalPort => "localPort",
            Column::RemoteIp => "remoteIp",
            Column::RemotePort => "remotePort",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Column::Id => "Id",
            Column::User => "User",
            Column::Information => "Information",
            Column::CreationDate => "Creation Date",
            Column::LocalIp => "Local IP",
            Column::LocalPort => "Local Port",
            Column::RemoteIp => "Remote IP",
            Column::RemotePort => "Remote Port",
        }
    }

    /// Cell text, as displayed and searched.
    pub fn text(self, visit: &Visit) -> String {
        match self {
            Column::Id => visit.id.clone(),
            Column::User => visit.user.clone(),
            Column::Information => visit.information.clone(),
            Column::CreationDate => visit.creation_date.format("%Y-%m-%d %H:%M:%S").to_string(),
            Column::LocalIp => visit.local_ip.clone(),
            Column::LocalPort => visit.local_port.to_string(),
            Column::RemoteIp => visit.remote_ip.clone(),
            Column::RemotePort => visit.remote_port.to_string(),
        }
    }

    fn compare(self, a: &Visit, b: &Visit) -> Ordering {
        match self {
            Column::Id => a.id.cmp(&b.id),
            Column::User => a.user.cmp(&b.user),
            Column::Information => a.information.cmp(&b.information),
            Column::CreationDate => a.creation_date.cmp(&b.creation_date),
            Column::LocalIp => a.local_ip.cmp(&b.local_ip),
            Column::LocalPort => a.local_port.cmp(&b.local_port),
            Column::RemoteIp => a.remote_ip.cmp(&b.remote_ip),
            Column::RemotePort => a.remote_port.cmp(&b.remote_port),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Rows of the visit page with sorting, free-text search, pagination and
/// single selection.
#[derive(Debug, Clone)]
pub struct VisitTable {
    rows: Vec<Visit>,
    sort: Option<(Column, SortOrder)>,
    search: String,
    page_size: usize,
    page: usize,
    selected: Option<String>,
}

impl Default for VisitTable {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PAGE_SIZE)
    }
}

impl VisitTable {
    pub const DEFAULT_PAGE_SIZE: usize = 10;

    pub fn new(page_size: usize) -> Self {
        Self {
            rows: Vec::new(),
            sort: None,
            search: String::new(),
            page_size: page_size.max(1),
            page: 0,
            selected: None,
        }
    }

    /// Replace the rows. The selection survives if its id is still present.
    pub fn fill(&mut self, rows: Vec<Visit>) {
        self.rows = rows;
        let still_present = self
            .selected
            .as_ref()
            .is_some_and(|id| self.rows.iter().any(|visit| &visit.id == id));
        if !still_present {
            self.selected = None;
        }
        self.page = self.page.min(self.page_count() - 1);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sort by `column`; sorting again by the same column flips the order.
    pub fn sort_by(&mut self, column: Column) {
        let order = match self.sort {
            Some((current, SortOrder::Ascending)) if current == column => SortOrder::Descending,
            _ => SortOrder::Ascending,
        };
        self.sort = Some((column, order));
    }

    pub fn set_sort(&mut self, column: Column, order: SortOrder) {
        self.sort = Some((column, order));
    }

    pub fn sort(&self) -> Option<(Column, SortOrder)> {
        self.sort
    }

    /// Case-insensitive match against every column. Resets to the first page.
    pub fn set_search(&mut self, text: impl Into<String>) {
        self.search = text.into();
        self.page = 0;
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Rows matching the search, in sort order.
    pub fn visible(&self) -> Vec<&Visit> {
        let needle = self.search.trim().to_lowercase();
        let mut rows: Vec<&Visit> = self
            .rows
            .iter()
            .filter(|visit| {
                needle.is_empty()
                    || Column::ALL
                        .iter()
                        .any(|column| column.text(visit).to_lowercase().contains(&needle))
            })
            .collect();

        if let Some((column, order)) = self.sort {
            rows.sort_by(|a, b| match order {
                SortOrder::Ascending => column.compare(a, b),
                SortOrder::Descending => column.compare(b, a),
            });
        }
        rows
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = self.page.min(self.page_count() - 1);
    }

    /// Never zero; an empty table has one empty page.
    pub fn page_count(&self) -> usize {
        self.visible().len().div_ceil(self.page_size).max(1)
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Zero-based; clamped to the last page.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.min(self.page_count() - 1);
    }

    pub fn current_page(&self) -> Vec<&Visit> {
        self.visible()
            .into_iter()
            .skip(self.page * self.page_size)
            .take(self.page_size)
            .collect()
    }

    /// Select the row with `id`, replacing any previous selection. Returns
    /// `false` (and clears the selection) when no such row exists.
    pub fn select(&mut self, id: &str) -> bool {
        if self.rows.iter().any(|visit| visit.id == id) {
            self.selected = Some(id.to_string());
            true
        } else {
            self.selected = None;
            false
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&Visit> {
        let id = self.selected.as_deref()?;
        self.rows.iter().find(|visit| visit.id == id)
    }

    /// Update and remove act on the selection.
    pub fn actions_enabled(&self) -> bool {
        self.selected().is_some()
    }
}
