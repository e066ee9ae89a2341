mod config;
mod output;
mod reader;

/// shorthand for a [crate::lines::LineReader] over in-memory text
fn reader(s: &str) -> crate::lines::LineReader<std::io::Cursor<&str>> {
    crate::lines::LineReader::new(std::io::Cursor::new(s))
}
