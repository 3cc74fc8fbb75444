//! Column value filter pipeline.
//!
//! A `Filter` is a pure transform over one cell value. Grounded on the
//! original `filters.Filter` interface (`Filter`/`ValidateArgs`/`Usage`) and
//! on the teacher's `redactor::strategy` trait-object dispatch style
//! (colocated `#[cfg(test)]` units per strategy).

use crate::error::DumpError;

/// A single value transform.
pub trait Filter {
    fn name(&self) -> &'static str;

    /// Applies the transform in place.
    fn apply(&self, value: &mut String, data_type: &str, max_length: i64, args: &[String]);

    /// Checked once, before any query runs, against the arguments bound to
    /// a particular `--filter` invocation.
    fn validate_args(&self, args: &[String]) -> Result<(), String>;

    fn usage(&self) -> &'static str;
}

pub struct EmptyFilter;

impl Filter for EmptyFilter {
    fn name(&self) -> &'static str {
        "empty"
    }

    fn apply(&self, value: &mut String, _data_type: &str, _max_length: i64, _args: &[String]) {
        value.clear();
    }

    fn validate_args(&self, args: &[String]) -> Result<(), String> {
        if !args.is_empty() {
            return Err(r#"Filter "empty" expects exactly 0 arguments."#.to_string());
        }
        Ok(())
    }

    fn usage(&self) -> &'static str {
        "empty users.password"
    }
}

pub struct RepeatFilter;

impl Filter for RepeatFilter {
    fn name(&self) -> &'static str {
        "repeat"
    }

    fn apply(&self, value: &mut String, _data_type: &str, max_length: i64, args: &[String]) {
        let len = max_length.max(0) as usize;
        *value = args[0].repeat(len);
    }

    fn validate_args(&self, args: &[String]) -> Result<(), String> {
        if args.len() != 1 {
            return Err(r#"Filter "repeat" expects exactly 1 argument."#.to_string());
        }
        Ok(())
    }

    fn usage(&self) -> &'static str {
        "repeat users.password <string>"
    }
}

/// One `--filter NAME table.column ARG...` binding.
#[derive(Debug, Clone)]
pub struct FilterCommand {
    pub filter_name: String,
    pub table_name: String,
    pub column_name: String,
    pub args: Vec<String>,
}

impl FilterCommand {
    /// Parses `"empty users.password"` / `"repeat users.password x"`.
    pub fn parse(spec: &str) -> Result<Self, DumpError> {
        let parts: Vec<&str> = spec.split(' ').collect();
        if parts.len() < 2 {
            return Err(DumpError::ConstraintSpec { raw: spec.to_string() });
        }
        let filter_name = parts[0].to_string();
        let (table_name, column_name) = parts[1]
            .split_once('.')
            .map(|(t, c)| (t.to_string(), c.to_string()))
            .ok_or_else(|| DumpError::ConstraintSpec { raw: spec.to_string() })?;
        let args = parts[2..].iter().map(|s| s.to_string()).collect();
        Ok(FilterCommand { filter_name, table_name, column_name, args })
    }
}

/// Owns the built-in filters and the set of commands bound by `--filter`
/// flags; applies matching commands, in registration order, to a cell.
pub struct FilterController {
    loaded: Vec<Box<dyn Filter>>,
    commands: Vec<FilterCommand>,
}

impl FilterController {
    pub fn new() -> Self {
        Self {
            loaded: vec![Box::new(EmptyFilter), Box::new(RepeatFilter)],
            commands: Vec::new(),
        }
    }

    /// Validates and stores each command; fails fast on unknown filter
    /// names or arity mismatches before any query runs.
    pub fn set_commands(&mut self, specs: &[String]) -> Result<(), DumpError> {
        for spec in specs {
            let cmd = FilterCommand::parse(spec)?;
            let filter = self
                .loaded
                .iter()
                .find(|f| f.name() == cmd.filter_name)
                .ok_or_else(|| DumpError::UnknownFilter { name: cmd.filter_name.clone() })?;
            filter.validate_args(&cmd.args).map_err(|reason| DumpError::FilterError {
                filter: cmd.filter_name.clone(),
                table: cmd.table_name.clone(),
                column: cmd.column_name.clone(),
                reason,
            })?;
            self.commands.push(cmd);
        }
        Ok(())
    }

    pub fn apply(
        &self,
        value: &mut String,
        table_name: &str,
        column_name: &str,
        data_type: &str,
        max_length: i64,
    ) {
        for cmd in &self.commands {
            if cmd.table_name.eq_ignore_ascii_case(table_name)
                && cmd.column_name.eq_ignore_ascii_case(column_name)
            {
                if let Some(filter) = self.loaded.iter().find(|f| f.name() == cmd.filter_name) {
                    filter.apply(value, data_type, max_length, &cmd.args);
                }
            }
        }
    }
}

impl Default for FilterController {
    fn default() -> Self {
        Self::new()
    }
}
