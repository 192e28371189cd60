use super::commands::PaletteCommand;

/// Commands whose title or description contains `query`, ignoring case.
/// An empty query keeps every command in order.
pub fn filter_commands<'a>(commands: &'a [PaletteCommand], query: &str) -> Vec<&'a PaletteCommand> {
    let query = query.to_lowercase();
    commands
        .iter()
        .filter(|command| {
            query.is_empty()
                || command.title.to_lowercase().contains(&query)
                || command.description.to_lowercase().contains(&query)
        })
        .collect()
}
