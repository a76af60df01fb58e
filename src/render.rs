/*!
 * Rendering of the derived view
 *
 * Text, JSON and CSV renderings of a [`RenderState`], used by the command
 * line front end in place of a browser view.
 */

use std::io::Write;
use serde::Serialize;

use crate::{Result, OutputFormat};
use crate::data_types::*;
use crate::query_sync::serialize_criteria;
use crate::state::{LoadStatus, RenderState};

/// Trait for implementing view renderers
pub trait ViewRenderer {
    /// Write the rendered view
    fn render(&self, state: &RenderState<'_>, writer: &mut dyn Write) -> Result<()>;

    /// Get the output format
    fn format(&self) -> OutputFormat;
}

/// Get the renderer for `format`, showing at most `limit` providers
pub fn renderer_for(format: OutputFormat, limit: Option<usize>) -> Box<dyn ViewRenderer> {
    match format {
        OutputFormat::Text => Box::new(TextRenderer { limit, ..TextRenderer::default() }),
        OutputFormat::Json => Box::new(JsonRenderer { limit, ..JsonRenderer::default() }),
        OutputFormat::Csv => Box::new(CsvRenderer { limit, ..CsvRenderer::default() }),
    }
}

fn visible<'a>(view: &'a DerivedView, limit: Option<usize>) -> &'a [ProviderRecord] {
    let n = limit.unwrap_or(view.len()).min(view.len());
    &view.visible_providers[..n]
}

/// Provider cards as plain text
#[derive(Debug, Clone, Default)]
pub struct TextRenderer {
    pub limit: Option<usize>,
    /// Whether to print the suggestion list above the cards
    pub show_suggestions: bool,
}

impl ViewRenderer for TextRenderer {
    fn render(&self, state: &RenderState<'_>, writer: &mut dyn Write) -> Result<()> {
        match state.status {
            LoadStatus::Loading => writeln!(writer, "Loading providers...")?,
            LoadStatus::Failed { message } => {
                writeln!(writer, "Could not load providers: {}", message)?
            }
            LoadStatus::Ready { .. } => {}
        }

        if self.show_suggestions && !state.view.name_suggestions.is_empty() {
            writeln!(writer, "Suggestions: {}", state.view.name_suggestions.join(" | "))?;
        }

        let shown = visible(state.view, self.limit);
        for provider in shown {
            writeln!(writer, "{}", provider.name)?;
            writeln!(writer, "  {}", provider.specialties.join(", "))?;
            writeln!(writer, "  {}", provider.experience_display())?;
            writeln!(writer, "  {}", provider.fee_display())?;
        }

        if shown.len() < state.view.len() {
            writeln!(writer, "... and {} more", state.view.len() - shown.len())?;
        }
        writeln!(writer, "Total matches: {}", state.view.len())?;
        Ok(())
    }

    fn format(&self) -> OutputFormat {
        OutputFormat::Text
    }
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    query: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    total: usize,
    suggestions: &'a [String],
    providers: &'a [ProviderRecord],
}

/// The view as a JSON document
#[derive(Debug, Clone)]
pub struct JsonRenderer {
    pub limit: Option<usize>,
    /// Whether to pretty-print the JSON
    pub pretty_print: bool,
}

impl Default for JsonRenderer {
    fn default() -> Self {
        Self {
            limit: None,
            pretty_print: true,
        }
    }
}

impl ViewRenderer for JsonRenderer {
    fn render(&self, state: &RenderState<'_>, writer: &mut dyn Write) -> Result<()> {
        let (status, error) = match state.status {
            LoadStatus::Loading => ("loading", None),
            LoadStatus::Ready { .. } => ("ready", None),
            LoadStatus::Failed { message } => ("failed", Some(message.as_str())),
        };
        let document = JsonDocument {
            query: serialize_criteria(state.criteria),
            status,
            error,
            total: state.view.len(),
            suggestions: &state.view.name_suggestions,
            providers: visible(state.view, self.limit),
        };

        if self.pretty_print {
            serde_json::to_writer_pretty(&mut *writer, &document)?;
        } else {
            serde_json::to_writer(&mut *writer, &document)?;
        }
        writeln!(writer)?;
        Ok(())
    }

    fn format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

/// One row per visible provider
#[derive(Debug, Clone)]
pub struct CsvRenderer {
    pub limit: Option<usize>,
    /// Whether to include headers
    pub include_headers: bool,
    /// Field delimiter
    pub delimiter: u8,
}

impl Default for CsvRenderer {
    fn default() -> Self {
        Self {
            limit: None,
            include_headers: true,
            delimiter: b',',
        }
    }
}

impl CsvRenderer {
    /// Set the delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl ViewRenderer for CsvRenderer {
    fn render(&self, state: &RenderState<'_>, writer: &mut dyn Write) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(writer);

        if self.include_headers {
            csv_writer.write_record([
                "id", "name", "specialties", "fee", "experience_years", "video_consult", "in_clinic",
            ])?;
        }

        for provider in visible(state.view, self.limit) {
            let specialties = provider.specialties.join("; ");
            let fee = provider.fee_amount.to_string();
            let experience = provider.experience_years.to_string();
            csv_writer.write_record([
                provider.id.as_str(),
                provider.name.as_str(),
                specialties.as_str(),
                fee.as_str(),
                experience.as_str(),
                if provider.supports_video_consult { "true" } else { "false" },
                if provider.supports_in_clinic { "true" } else { "false" },
            ])?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    fn format(&self) -> OutputFormat {
        OutputFormat::Csv
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> DerivedView {
        DerivedView {
            visible_providers: vec![ProviderRecord {
                id: ProviderId::new("1"),
                name: "Dr. A".to_string(),
                photo_url: String::new(),
                specialties: vec!["Dentist".to_string(), "ENT".to_string()],
                fee_amount: 500,
                experience_years: 13,
                supports_video_consult: true,
                supports_in_clinic: false,
            }],
            name_suggestions: vec!["Dr. A".to_string()],
        }
    }

    fn render(renderer: &dyn ViewRenderer, status: LoadStatus) -> String {
        let criteria = FilterCriteria::new().with_search("dr");
        let view = view();
        let state = RenderState { criteria: &criteria, view: &view, status: &status };
        let mut out = Vec::new();
        renderer.render(&state, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_text_card() {
        let text = render(&TextRenderer::default(), LoadStatus::Ready { skipped: 0 });
        assert_eq!(
            text,
            "Dr. A\n  Dentist, ENT\n  13 years of experience\n  ₹500\nTotal matches: 1\n"
        );
    }

    #[test]
    fn test_text_failed_status() {
        let text = render(&TextRenderer::default(), LoadStatus::Failed { message: "offline".to_string() });
        assert!(text.starts_with("Could not load providers: offline\n"));
    }

    #[test]
    fn test_json_document() {
        let json = render(&JsonRenderer::default(), LoadStatus::Ready { skipped: 0 });
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["query"], "search=dr");
        assert_eq!(value["status"], "ready");
        assert_eq!(value["providers"][0]["fee_amount"], 500);
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_csv_rows() {
        let csv = render(&CsvRenderer::default(), LoadStatus::Ready { skipped: 0 });
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("id,name,specialties,fee,experience_years,video_consult,in_clinic"));
        assert_eq!(lines.next(), Some("1,Dr. A,Dentist; ENT,500,13,true,false"));
    }

    #[test]
    fn test_limit() {
        let text = render(&TextRenderer { limit: Some(0), show_suggestions: true }, LoadStatus::Ready { skipped: 0 });
        assert_eq!(text, "Suggestions: Dr. A\n... and 1 more\nTotal matches: 1\n");
    }
}
