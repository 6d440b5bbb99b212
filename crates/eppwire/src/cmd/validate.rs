use eppwire_client::{ClientError, FrameInput};

use crate::cmd::ValidateArgs;
use crate::exit::{client_error, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_validation, OutputFormat, Validation};

pub fn run(args: ValidateArgs, format: OutputFormat) -> CliResult<i32> {
    let input = args.payload.input()?;
    let source = describe(&input);

    match input.into_payload() {
        Ok(payload) => {
            print_validation(
                &Validation {
                    source: &source,
                    size: payload.len(),
                    error: None,
                },
                format,
            );
            Ok(SUCCESS)
        }
        Err(ClientError::Syntax { source: err, .. }) => {
            print_validation(
                &Validation {
                    source: &source,
                    size: err.document().len(),
                    error: Some(&err),
                },
                format,
            );
            Ok(DATA_INVALID)
        }
        Err(err) => Err(client_error("cannot validate", err)),
    }
}

fn describe(input: &FrameInput) -> String {
    match input {
        FrameInput::File(path) => path.display().to_string(),
        FrameInput::Xml(_) => "<text>".to_string(),
        FrameInput::Document(_) => "<document>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn describes_inputs() {
        assert_eq!(describe(&FrameInput::Xml("<a/>".into())), "<text>");
        assert_eq!(
            describe(&FrameInput::File(PathBuf::from("/tmp/hello.xml"))),
            "/tmp/hello.xml"
        );
    }
}
