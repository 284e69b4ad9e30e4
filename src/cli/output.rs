use serde::Serialize;

#[expect(clippy::print_stdout, reason = "command output goes to stdout")]
pub(crate) fn line(message: &str) {
    println!("{message}");
}

pub(crate) fn json<T: Serialize>(value: &T) -> Result<(), String> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|error| format!("failed to render output: {error}"))?;

    line(&rendered);

    Ok(())
}
