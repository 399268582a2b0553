use std::fmt::Display;

/// Output format configuration
#[derive(Clone, Debug)]
pub struct OutputFormat {
    pub raw: bool,
}

impl OutputFormat {
    pub fn new(raw: bool) -> Self {
        Self { raw }
    }

    /// Print tabular data - either raw (tab-separated) or formatted (column-aligned)
    pub fn print_table<T>(&self, data: &[Vec<T>])
    where
        T: Display + AsRef<str>,
    {
        let rendered = self.render_table(data);
        if !rendered.is_empty() {
            print!("{rendered}");
        }
    }

    /// Print single-column data
    pub fn print_list<T>(&self, items: &[T])
    where
        T: Display,
    {
        for item in items {
            println!("{item}");
        }
    }

    /// Print key-value pairs
    pub fn print_key_value<K, V>(&self, pairs: &[(K, V)])
    where
        K: Display + AsRef<str>,
        V: Display + AsRef<str>,
    {
        let data: Vec<Vec<String>> = pairs
            .iter()
            .map(|(k, v)| vec![k.to_string(), v.to_string()])
            .collect();

        self.print_table(&data);
    }

    /// Render tabular data to a string, one line per row
    pub fn render_table<T>(&self, data: &[Vec<T>]) -> String
    where
        T: Display + AsRef<str>,
    {
        if data.is_empty() {
            return String::new();
        }

        if self.raw {
            return data
                .iter()
                .map(|row| {
                    let line = row
                        .iter()
                        .map(|cell| cell.as_ref())
                        .collect::<Vec<_>>()
                        .join("\t");
                    format!("{line}\n")
                })
                .collect();
        }

        // Column-aligned like `column -t`
        let num_cols = data.iter().map(Vec::len).max().unwrap_or(0);
        let mut col_widths = vec![0; num_cols];
        for row in data {
            for (i, cell) in row.iter().enumerate() {
                col_widths[i] = col_widths[i].max(cell.as_ref().chars().count());
            }
        }

        let mut out = String::new();
        for row in data {
            let formatted_cells: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(i, cell)| {
                    if i == row.len() - 1 {
                        cell.to_string()
                    } else {
                        format!("{:<width$}", cell.as_ref(), width = col_widths[i])
                    }
                })
                .collect();
            out.push_str(&formatted_cells.join("  "));
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_output() {
        let format = OutputFormat::new(true);
        let data = vec![
            vec!["short", "medium", "very_long_column"],
            vec!["a", "bb", "ccc"],
        ];

        assert_eq!(
            format.render_table(&data),
            "short\tmedium\tvery_long_column\na\tbb\tccc\n"
        );
    }

    #[test]
    fn test_formatted_output() {
        let format = OutputFormat::new(false);
        let data = vec![
            vec!["short", "medium", "very_long_column"],
            vec!["a", "bb", "ccc"],
        ];

        assert_eq!(
            format.render_table(&data),
            "short  medium  very_long_column\na      bb      ccc\n"
        );
    }

    #[test]
    fn test_empty_table() {
        let format = OutputFormat::new(false);
        let data: Vec<Vec<String>> = Vec::new();
        assert!(format.render_table(&data).is_empty());
    }
}
