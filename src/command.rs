use std::str::FromStr;

/// A tool command split into its name and positional arguments, e.g.
/// `generate 0 -1`.
pub struct Command<'a> {
    parts: Vec<&'a str>,
}

impl<'a> Command<'a> {
    pub fn parse(args: &'a [String]) -> Option<Command<'a>> {
        let parts = args.iter().map(String::as_str).collect::<Vec<&str>>();
        if parts.is_empty() {
            None
        } else {
            Some(Command { parts })
        }
    }

    pub fn name(&self) -> &'a str {
        self.parts[0]
    }

    pub fn arg<T: FromStr>(&self, idx: usize) -> Result<T, String> {
        let arg_no = idx + 1;
        if arg_no >= self.parts.len() {
            return Err(format!("Missing argument {}", arg_no));
        }

        match self.parts[arg_no].parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => Err(format!("Argument {} is not valid", arg_no)),
        }
    }
}
