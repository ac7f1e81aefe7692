use brush_parser::ast;

/// A parsed segment of a shell command, representing one program invocation.
#[derive(Debug, PartialEq)]
pub(crate) struct CommandSegment {
    /// The program word exactly as written (`./run-tests.sh`, `npm`).
    pub(crate) program: String,
    pub(crate) args: Vec<String>,
}

/// Error returned when a command string cannot be parsed.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ParseError(pub String);

/// Parse a shell command string into individual command segments, in the
/// order the shell would reach them.
///
/// Uses brush-parser to build a proper shell AST, then walks it to extract
/// program names. Correctly handles quoting, escaping, subshells, and
/// compound commands.
pub(crate) fn parse(command: &str) -> Result<Vec<CommandSegment>, ParseError> {
    if command.trim().is_empty() {
        return Ok(vec![]);
    }

    let mut parser = brush_parser::Parser::builder()
        .reader(std::io::Cursor::new(command.to_string()))
        .build();

    let program = parser
        .parse_program()
        .map_err(|e| ParseError(e.to_string()))?;

    let mut segments = Vec::new();
    visit_program(&program, &mut segments);
    Ok(segments)
}

/// The first program a test command launches, if any.
///
/// `npm test && npm run lint` → `npm`; `CI=1 ./run-tests.sh` → `./run-tests.sh`.
pub(crate) fn first_program(command: &str) -> Result<Option<String>, ParseError> {
    Ok(parse(command)?.into_iter().next().map(|s| s.program))
}

fn visit_program(program: &ast::Program, segments: &mut Vec<CommandSegment>) {
    for complete_command in &program.complete_commands {
        for item in &complete_command.0 {
            visit_and_or_list(&item.0, segments);
        }
    }
}

fn visit_and_or_list(list: &ast::AndOrList, segments: &mut Vec<CommandSegment>) {
    visit_pipeline(&list.first, segments);
    for and_or in &list.additional {
        match and_or {
            ast::AndOr::And(pipeline) | ast::AndOr::Or(pipeline) => {
                visit_pipeline(pipeline, segments);
            }
        }
    }
}

fn visit_pipeline(pipeline: &ast::Pipeline, segments: &mut Vec<CommandSegment>) {
    for command in &pipeline.seq {
        visit_command(command, segments);
    }
}

/// Shell builtins and utilities that transparently execute another program.
const TRANSPARENT_WRAPPERS: &[&str] = &["command", "env", "nohup", "exec", "time"];

fn visit_command(command: &ast::Command, segments: &mut Vec<CommandSegment>) {
    match command {
        ast::Command::Simple(simple) => {
            let Some(word) = &simple.word_or_name else {
                return;
            };
            let name = word.flatten();
            if name.is_empty() {
                return;
            }
            let words = suffix_words(&simple.suffix);
            if TRANSPARENT_WRAPPERS.contains(&basename(&name)) {
                if let Some(segment) = unwrap_wrapper(&words) {
                    segments.push(segment);
                    return;
                }
            }
            segments.push(CommandSegment {
                program: name,
                args: words,
            });
        }
        ast::Command::Compound(compound, _) => visit_compound(compound, segments),
        // Defining a function runs nothing.
        ast::Command::Function(_) => {}
        ast::Command::ExtendedTest(_) => {}
    }
}

fn basename(name: &str) -> &str {
    std::path::Path::new(name)
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or(name)
}

/// Word arguments of a simple command; redirections and assignments skipped.
fn suffix_words(suffix: &Option<ast::CommandSuffix>) -> Vec<String> {
    let Some(suffix) = suffix else {
        return vec![];
    };
    suffix
        .0
        .iter()
        .filter_map(|item| match item {
            ast::CommandPrefixOrSuffixItem::Word(word) => Some(word.flatten()),
            _ => None,
        })
        .collect()
}

/// Find the program behind `env FOO=1 make test`, `command -p npm test` and
/// nested wrappers. Options and `NAME=value` words are skipped.
fn unwrap_wrapper(words: &[String]) -> Option<CommandSegment> {
    let mut rest = words;
    while let Some((first, tail)) = rest.split_first() {
        if first.starts_with('-') || first.contains('=') {
            rest = tail;
            continue;
        }
        if TRANSPARENT_WRAPPERS.contains(&basename(first)) {
            rest = tail;
            continue;
        }
        return Some(CommandSegment {
            program: first.clone(),
            args: tail.to_vec(),
        });
    }
    None
}

fn visit_compound(command: &ast::CompoundCommand, segments: &mut Vec<CommandSegment>) {
    match command {
        ast::CompoundCommand::BraceGroup(cmd) => visit_compound_list(&cmd.list, segments),
        ast::CompoundCommand::Subshell(cmd) => visit_compound_list(&cmd.list, segments),
        ast::CompoundCommand::ForClause(cmd) => visit_compound_list(&cmd.body.list, segments),
        ast::CompoundCommand::ArithmeticForClause(cmd) => {
            visit_compound_list(&cmd.body.list, segments);
        }
        ast::CompoundCommand::WhileClause(cmd) | ast::CompoundCommand::UntilClause(cmd) => {
            visit_compound_list(&cmd.0, segments);
            visit_compound_list(&cmd.1.list, segments);
        }
        ast::CompoundCommand::IfClause(cmd) => {
            visit_compound_list(&cmd.condition, segments);
            visit_compound_list(&cmd.then, segments);
            if let Some(elses) = &cmd.elses {
                for clause in elses {
                    if let Some(condition) = &clause.condition {
                        visit_compound_list(condition, segments);
                    }
                    visit_compound_list(&clause.body, segments);
                }
            }
        }
        ast::CompoundCommand::CaseClause(cmd) => {
            for case_item in &cmd.cases {
                if let Some(body) = &case_item.cmd {
                    visit_compound_list(body, segments);
                }
            }
        }
        ast::CompoundCommand::Arithmetic(_) => {}
    }
}

fn visit_compound_list(list: &ast::CompoundList, segments: &mut Vec<CommandSegment>) {
    for item in &list.0 {
        visit_and_or_list(&item.0, segments);
    }
}
