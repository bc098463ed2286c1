use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Row, Table};
use numen::{format_number, Id, Registry};

pub struct Formatter {}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter {
    pub fn new() -> Self {
        Self {}
    }

    pub fn format_raw(&self, value: f64) -> String {
        format_number(value)
    }

    /// A formula, its value-substituted form and its result
    pub fn format_result(&self, expression: &str, rendered: &str, value: f64) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.add_row(Row::from(vec![Cell::new(format!(
            "{} = {}",
            expression,
            format_number(value)
        ))]));
        table.add_row(Row::from(vec![Cell::new(format!("└─ = {}", rendered))]));
        format!("{}\n", table)
    }

    pub fn format_check(&self, condition: &str, rendered: &str, holds: bool) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.add_row(Row::from(vec![Cell::new(format!("{} is {}", condition, holds))]));
        table.add_row(Row::from(vec![Cell::new(format!("└─ {}", rendered))]));
        format!("{}\n", table)
    }

    /// Name/value table of the names a run assigned, preceded by the
    /// return value of a process
    pub fn format_values(&self, values: &[(String, f64)], returned: Option<f64>) -> String {
        let mut output = String::new();
        if let Some(value) = returned {
            output.push_str(&format!("return = {}\n", format_number(value)));
        }
        if values.is_empty() {
            output.push_str("No names were assigned.\n");
            return output;
        }

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(Row::from(vec![
            Cell::new("Name").set_alignment(CellAlignment::Left),
            Cell::new("Value").set_alignment(CellAlignment::Right),
        ]));
        for (name, value) in values {
            table.add_row(Row::from(vec![
                Cell::new(name),
                Cell::new(format_number(*value)).set_alignment(CellAlignment::Right),
            ]));
        }
        output.push_str(&table.to_string());
        output.push('\n');
        output
    }

    pub fn format_names(&self, registry: &Registry, ids: &[Id]) -> String {
        if ids.is_empty() {
            return "The catalog declares no names.\n".to_string();
        }

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(Row::from(vec![
            Cell::new("Name"),
            Cell::new("Type"),
            Cell::new("Id"),
            Cell::new("Cycle"),
            Cell::new("Init"),
            Cell::new("Min"),
            Cell::new("Max"),
        ]));

        for id in ids {
            let Some(record) = registry.record(*id) else {
                continue;
            };
            let bounds = record.bounds();
            let max = if bounds.max == 0.0 {
                "-".to_string()
            } else {
                format_number(bounds.max)
            };
            table.add_row(Row::from(vec![
                Cell::new(record.name()),
                Cell::new(registry.type_label(*id).unwrap_or("(ordered)")),
                Cell::new(id.to_string()),
                Cell::new(record.cycle().to_string()),
                Cell::new(format_number(bounds.init)),
                Cell::new(format_number(bounds.min)),
                Cell::new(max),
            ]));
        }

        format!("{}\n", table)
    }
}
