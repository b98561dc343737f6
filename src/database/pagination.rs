use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub label: String,
    pub offset: i64,
    pub current: bool,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PageContext<T> {
    pub rows: Vec<T>,
    pub total_rows: i64,
    pub next_offset: i64,
    pub prev_offset: i64,
    pub page_list: Vec<PageLink>,
    pub message: Option<String>,
}

impl<T> PageContext<T> {
    pub fn from_rows(rows: Vec<T>, total_rows: i64, page_size: i64, current_offset: i64) -> Self {
        if rows.is_empty() || page_size <= 0 {
            return Self::no_rows();
        }
        let page_count = (total_rows + page_size - 1) / page_size;
        let last_offset = (page_count - 1).max(0) * page_size;

        let next_offset = (current_offset + page_size).min(last_offset);
        let prev_offset = (current_offset - page_size).max(0);
        let current_page = current_offset / page_size;

        let page_list = (0..page_count)
            .map(|n| PageLink {
                label: format!("{}", n + 1),
                offset: n * page_size,
                current: n == current_page,
            })
            .collect();

        Self {
            rows,
            total_rows,
            next_offset,
            prev_offset,
            page_list,
            message: Some(format!(
                "{} - {} / {}",
                current_offset + 1,
                (current_offset + page_size).min(total_rows),
                total_rows
            )),
        }
    }

    pub fn no_rows() -> Self {
        Self {
            rows: vec![],
            total_rows: 0,
            next_offset: 0,
            prev_offset: 0,
            page_list: vec![PageLink {
                label: String::from("1"),
                offset: 0,
                current: true,
            }],
            message: Some(String::from("No results")),
        }
    }

    pub fn map<U, F>(self, f: F) -> PageContext<U>
    where
        F: FnMut(T) -> U,
    {
        PageContext {
            rows: self.rows.into_iter().map(f).collect(),
            total_rows: self.total_rows,
            next_offset: self.next_offset,
            prev_offset: self.prev_offset,
            page_list: self.page_list,
            message: self.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middle_page() {
        let page = PageContext::from_rows(vec![1; 10], 35, 10, 10);
        assert_eq!(page.next_offset, 20);
        assert_eq!(page.prev_offset, 0);
        assert_eq!(page.page_list.len(), 4);
        assert!(page.page_list[1].current);
        assert_eq!(page.page_list[3].offset, 30);
        assert_eq!(page.message.as_deref(), Some("11 - 20 / 35"));
    }

    #[test]
    fn last_page_does_not_advance() {
        let page = PageContext::from_rows(vec![1; 5], 35, 10, 30);
        assert_eq!(page.next_offset, 30);
        assert_eq!(page.prev_offset, 20);
    }

    #[test]
    fn exact_multiple_has_no_empty_trailing_page() {
        let page = PageContext::from_rows(vec![1; 10], 20, 10, 0);
        assert_eq!(page.page_list.len(), 2);
        assert_eq!(page.next_offset, 10);
    }

    #[test]
    fn empty_rows() {
        let page = PageContext::<i32>::from_rows(vec![], 0, 10, 0);
        assert_eq!(page.total_rows, 0);
        assert_eq!(page.message.as_deref(), Some("No results"));
    }
}
