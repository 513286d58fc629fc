use std::str::FromStr;

use rust_decimal::Decimal;

/// A single cell of an uploaded table.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(Decimal),
}

impl Cell {
    pub fn text(value: &str) -> Self {
        if value.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_owned())
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Numeric value of the cell, parsing text when needed.
    ///
    /// Returns `None` for blank cells and for text that is not a number.
    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Cell::Empty => None,
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return None;
                }
                Decimal::from_str(s)
                    .or_else(|_| Decimal::from_scientific(s))
                    .ok()
            }
        }
    }

    /// Key form of the cell. Text is kept verbatim, without trimming.
    pub fn to_key(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) if s.trim().is_empty() => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) => Some(n.normalize().to_string()),
        }
    }
}

/// Header row plus data rows, as handed over by a file loader.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: vec![],
        }
    }

    /// Appends a row, padding or truncating it to the header width.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.headers.len(), Cell::Empty);
        self.rows.push(row);
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Source column names bound to each field of a sales record.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub customer_id: String,
    pub order_amount: String,
    pub handler: String,
    pub item_name: String,
    pub gross_profit: String,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            customer_id: String::from("得意先"),
            order_amount: String::from("受注額"),
            handler: String::from("担当者"),
            item_name: String::from("品名"),
            gross_profit: String::from("粗利益(B-L)"),
        }
    }
}

impl Schema {
    pub fn required(&self) -> [&str; 2] {
        [&self.customer_id, &self.order_amount]
    }

    pub fn optional(&self) -> [&str; 3] {
        [&self.handler, &self.item_name, &self.gross_profit]
    }
}
