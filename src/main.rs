use crossterm::style::Stylize;
use std::io::{self, BufRead, Write};
use stepwise::logging::init_tracing;
use stepwise::{
    Advance, DefinitionError, FieldKind, Retreat, StepStatus, Value, Wizard, WizardDefinition,
};

const HELP: &str = "commands: set <field> <text> | check <field> | uncheck <field> | \
                    clear <field> | next | back | state | quit";

fn main() {
    init_tracing();
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
    }
}

fn run() -> io::Result<()> {
    let definition = match std::env::args().nth(1) {
        Some(path) => WizardDefinition::from_path(path),
        None => WizardDefinition::signup(),
    };
    let mut wizard = match definition.and_then(WizardDefinition::build) {
        Ok(wizard) => wizard,
        Err(err) => return Err(definition_error(err)),
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    render(&wizard, &mut stdout)?;

    for line in stdin.lock().lines() {
        let line = line?;
        match handle_command(&mut wizard, line.trim()) {
            Command::Continue => render(&wizard, &mut stdout)?,
            Command::Message(message) => writeln!(stdout, "{message}")?,
            Command::Exit => break,
        }
        if wizard.is_submitted() {
            writeln!(stdout, "{}", "Done.".green().bold())?;
            break;
        }
    }

    Ok(())
}

enum Command {
    Continue,
    Message(String),
    Exit,
}

fn handle_command(wizard: &mut Wizard, line: &str) -> Command {
    let mut parts = line.splitn(3, ' ');
    let verb = parts.next().unwrap_or_default();
    let field = parts.next();
    let rest = parts.next().unwrap_or_default();

    let result = match (verb, field) {
        ("set", Some(field)) => wizard.on_field_change(field, Value::text(rest)).map(|_| ()),
        ("check", Some(field)) => wizard.on_field_change(field, true).map(|_| ()),
        ("uncheck", Some(field)) => wizard.on_field_change(field, false).map(|_| ()),
        ("clear", Some(field)) => wizard.on_field_change(field, Value::None).map(|_| ()),
        ("next", None) => match wizard.on_advance() {
            Ok(Advance::Submitted(submission)) => {
                return match submission.to_json() {
                    Ok(record) => Command::Message(format!("{} {record}", "Submitted:".green())),
                    Err(err) => Command::Message(
                        format!("Submitted, but the record could not be rendered: {err}")
                            .red()
                            .to_string(),
                    ),
                };
            }
            Ok(_) => Ok(()),
            Err(err) => Err(err),
        },
        ("back", None) => match wizard.on_retreat() {
            Ok(Retreat::AtFirstStep) => {
                return Command::Message("Already on the first step.".dim().to_string());
            }
            Ok(Retreat::Moved { .. }) => Ok(()),
            Err(err) => Err(err),
        },
        ("state", None) => {
            return match serde_json::to_string_pretty(&wizard.snapshot()) {
                Ok(snapshot) => Command::Message(snapshot),
                Err(err) => Command::Message(
                    format!("Could not render state: {err}").red().to_string(),
                ),
            };
        }
        ("quit", None) | ("exit", None) => return Command::Exit,
        _ => return Command::Message(HELP.to_string()),
    };

    match result {
        Ok(()) => Command::Continue,
        Err(err) => Command::Message(err.to_string().red().to_string()),
    }
}

fn render(wizard: &Wizard, out: &mut impl Write) -> io::Result<()> {
    let stepper: Vec<String> = wizard
        .steps()
        .map(|(step, status)| match status {
            StepStatus::Active => format!("● {}", step.title).bold().to_string(),
            StepStatus::Done => format!("✔ {}", step.title).green().to_string(),
            StepStatus::Pending => format!("○ {}", step.title).dim().to_string(),
        })
        .collect();
    writeln!(out)?;
    writeln!(out, "{}", stepper.join("  "))?;
    if let Some(description) = &wizard.current_step_schema().description {
        writeln!(out, "{}", description.as_str().italic())?;
    }

    let errors = wizard.field_errors();
    for field in wizard.visible_fields() {
        let value = wizard.field_value(field.id.as_str());
        let shown = match field.kind {
            FieldKind::Checkbox if value.as_bool() == Some(true) => "[x]",
            FieldKind::Checkbox => "[ ]",
            FieldKind::Text => value.as_text().unwrap_or_default(),
        };
        write!(out, "  {} ({}): {}", field.label, field.id.as_str().dim(), shown)?;
        if let Some(error) = errors.get(field.id.as_str()) {
            write!(out, "  {}", error.as_str().red())?;
        }
        writeln!(out)?;
    }

    let action = if wizard.current_step() + 1 == wizard.step_count() {
        "next = Finalizar"
    } else {
        "next = Próximo"
    };
    writeln!(out, "{}", action.dim())?;
    out.flush()
}

fn definition_error(err: DefinitionError) -> io::Error {
    match err {
        DefinitionError::Io(err) => err,
        other => io::Error::new(io::ErrorKind::InvalidData, other),
    }
}
