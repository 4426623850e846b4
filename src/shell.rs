use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShellError {
    #[error("Unterminated {quote} quote")]
    UnterminatedQuote { quote: char },
    #[error("Trailing backslash at end of input")]
    TrailingBackslash,
}

/// Split shell input into curl argument vectors, command word included.
pub fn split_commands(input: &str) -> Result<Vec<Vec<String>>, ShellError> {
    let statements = split_statements(input)?;

    Ok(statements
        .into_iter()
        .filter(|words| {
            let keep = words.first().is_some_and(|cmd| is_curl_command(cmd));
            if !keep {
                tracing::debug!(command = ?words.first(), "skipping non-curl statement");
            }
            keep
        })
        .collect())
}

pub fn split_statements(input: &str) -> Result<Vec<Vec<String>>, ShellError> {
    Lexer::new(input).run()
}

fn is_curl_command(word: &str) -> bool {
    word == "curl" || word.ends_with("/curl") || word.eq_ignore_ascii_case("curl.exe")
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    statements: Vec<Vec<String>>,
    words: Vec<String>,
    word: String,
    // An empty quoted string still counts as a word.
    in_word: bool,
}

impl Lexer {
    fn new(input: &str) -> Self {
        Lexer {
            chars: input.chars().collect(),
            pos: 0,
            statements: Vec::new(),
            words: Vec::new(),
            word: String::new(),
            in_word: false,
        }
    }

    fn next(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn run(mut self) -> Result<Vec<Vec<String>>, ShellError> {
        while let Some(c) = self.next() {
            match c {
                ' ' | '\t' => self.finish_word(),
                '\r' if self.peek() == Some('\n') => {}
                '\r' => self.finish_word(),
                '\n' | ';' => self.finish_statement(),
                '&' | '|' => {
                    self.eat(c);
                    self.finish_statement();
                }
                '\\' => match self.next() {
                    None => return Err(ShellError::TrailingBackslash),
                    Some('\n') => {}
                    Some('\r') if self.eat('\n') => {}
                    Some(escaped) => self.push(escaped),
                },
                '\'' => self.single_quoted()?,
                '"' => self.double_quoted()?,
                '$' if self.eat('\'') => self.ansi_c_quoted()?,
                '#' if !self.in_word => self.skip_comment(),
                _ => self.push(c),
            }
        }

        self.finish_statement();
        Ok(self.statements)
    }

    fn push(&mut self, c: char) {
        self.word.push(c);
        self.in_word = true;
    }

    fn finish_word(&mut self) {
        if self.in_word {
            self.words.push(std::mem::take(&mut self.word));
            self.in_word = false;
        }
    }

    fn finish_statement(&mut self) {
        self.finish_word();
        if !self.words.is_empty() {
            self.statements.push(std::mem::take(&mut self.words));
        }
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.pos += 1;
        }
    }

    fn single_quoted(&mut self) -> Result<(), ShellError> {
        self.in_word = true;
        loop {
            match self.next() {
                None => return Err(ShellError::UnterminatedQuote { quote: '\'' }),
                Some('\'') => return Ok(()),
                Some(c) => self.word.push(c),
            }
        }
    }

    fn double_quoted(&mut self) -> Result<(), ShellError> {
        self.in_word = true;
        loop {
            match self.next() {
                None => return Err(ShellError::UnterminatedQuote { quote: '"' }),
                Some('"') => return Ok(()),
                Some('\\') => match self.next() {
                    None => return Err(ShellError::UnterminatedQuote { quote: '"' }),
                    Some('\n') => {}
                    Some(c @ ('"' | '\\' | '$' | '`')) => self.word.push(c),
                    Some(c) => {
                        self.word.push('\\');
                        self.word.push(c);
                    }
                },
                Some(c) => self.word.push(c),
            }
        }
    }

    fn ansi_c_quoted(&mut self) -> Result<(), ShellError> {
        self.in_word = true;
        loop {
            match self.next() {
                None => return Err(ShellError::UnterminatedQuote { quote: '\'' }),
                Some('\'') => return Ok(()),
                Some('\\') => {
                    let Some(escaped) = self.next() else {
                        return Err(ShellError::UnterminatedQuote { quote: '\'' });
                    };
                    match escaped {
                        'n' => self.word.push('\n'),
                        'r' => self.word.push('\r'),
                        't' => self.word.push('\t'),
                        'e' | 'E' => self.word.push('\x1b'),
                        '0' => self.word.push('\0'),
                        '\\' | '\'' | '"' | '?' => self.word.push(escaped),
                        'x' => self.push_code_point(2, escaped),
                        'u' => self.push_code_point(4, escaped),
                        'U' => self.push_code_point(8, escaped),
                        other => {
                            self.word.push('\\');
                            self.word.push(other);
                        }
                    }
                }
                Some(c) => self.word.push(c),
            }
        }
    }

    // No digits keeps the escape literally.
    fn push_code_point(&mut self, max_digits: usize, marker: char) {
        let mut value: u32 = 0;
        let mut digits = 0;
        while digits < max_digits {
            let Some(d) = self.peek().and_then(|c| c.to_digit(16)) else {
                break;
            };
            value = value * 16 + d;
            digits += 1;
            self.pos += 1;
        }

        if digits == 0 {
            self.word.push('\\');
            self.word.push(marker);
            return;
        }

        self.word
            .push(char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(input: &str) -> Vec<Vec<String>> {
        split_statements(input).unwrap()
    }

    #[test]
    fn test_split_simple_command() {
        assert_eq!(words("curl http://example.com"), vec![vec!["curl", "http://example.com"]]);
    }

    #[test]
    fn test_split_collapses_whitespace() {
        assert_eq!(
            words("  curl   -s\t http://example.com  "),
            vec![vec!["curl", "-s", "http://example.com"]]
        );
    }

    #[test]
    fn test_single_quotes_are_literal() {
        let result = words(r#"curl -d '{"a": "b\n"; $HOME}' x"#);
        assert_eq!(result[0][2], r#"{"a": "b\n"; $HOME}"#);
    }

    #[test]
    fn test_double_quote_escapes() {
        let result = words(r#"curl -H "X-Quote: \"hi\" \\ \$HOME \n""#);
        assert_eq!(result[0][2], r#"X-Quote: "hi" \ $HOME \n"#);
    }

    #[test]
    fn test_unquoted_backslash_escapes_next_char() {
        let result = words(r"curl -d a\ b\;c x");
        assert_eq!(result, vec![vec!["curl", "-d", "a b;c", "x"]]);
    }

    #[test]
    fn test_line_continuation() {
        let input = "curl -X POST \\\n  -H 'A: 1' \\\r\n  http://example.com";
        assert_eq!(
            words(input),
            vec![vec!["curl", "-X", "POST", "-H", "A: 1", "http://example.com"]]
        );
    }

    #[test]
    fn test_line_continuation_inside_double_quotes() {
        assert_eq!(words("curl \"ab\\\ncd\"")[0][1], "abcd");
    }

    #[test]
    fn test_multiple_statements() {
        let result = words("curl http://a.com; curl http://b.com\ncurl http://c.com");
        assert_eq!(result.len(), 3);
        assert_eq!(result[1], vec!["curl", "http://b.com"]);
        assert_eq!(result[2], vec!["curl", "http://c.com"]);
    }

    #[test]
    fn test_terminators_inside_quotes_are_literal() {
        let result = words("curl -d 'a;b\nc' \"x;y\"");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0][2], "a;b\nc");
        assert_eq!(result[0][3], "x;y");
    }

    #[test]
    fn test_control_operators_end_statements() {
        let result = words("curl http://a.com && curl http://b.com | jq . || true & echo");
        let commands: Vec<&str> = result.iter().map(|w| w[0].as_str()).collect();
        assert_eq!(commands, vec!["curl", "curl", "jq", "true", "echo"]);
    }

    #[test]
    fn test_adjacent_pieces_join_into_one_word() {
        assert_eq!(words(r#"curl -H'X: 1'"y"z"#)[0], vec!["curl", "-HX: 1yz"]);
    }

    #[test]
    fn test_empty_quoted_word() {
        assert_eq!(words("curl -d '' x")[0], vec!["curl", "-d", "", "x"]);
    }

    #[test]
    fn test_ansi_c_quoting() {
        let result = words(r#"curl --data-raw $'{\"a\":\n\t\x41é\'}' x"#);
        assert_eq!(result[0][2], "{\"a\":\n\tAé'}");
    }

    #[test]
    fn test_comments() {
        let result = words("# fetch it\ncurl http://a.com # trailing\ncurl x#y");
        assert_eq!(result, vec![vec!["curl", "http://a.com"], vec!["curl", "x#y"]]);
    }

    #[test]
    fn test_unterminated_single_quote() {
        assert_eq!(
            split_statements("curl -d 'abc"),
            Err(ShellError::UnterminatedQuote { quote: '\'' })
        );
    }

    #[test]
    fn test_unterminated_double_quote() {
        assert_eq!(
            split_statements("curl -d \"abc\\\""),
            Err(ShellError::UnterminatedQuote { quote: '"' })
        );
    }

    #[test]
    fn test_trailing_backslash() {
        assert_eq!(
            split_statements("curl http://example.com \\"),
            Err(ShellError::TrailingBackslash)
        );
    }

    #[test]
    fn test_error_reported_even_after_valid_statement() {
        assert!(split_commands("curl http://a.com; curl 'oops").is_err());
    }

    #[test]
    fn test_split_commands_skips_non_curl() {
        let result = split_commands("echo hi; /usr/bin/curl http://a.com; wget x; curl.exe b").unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0][0], "/usr/bin/curl");
        assert_eq!(result[1][0], "curl.exe");
    }

    #[test]
    fn test_empty_input() {
        assert!(split_commands("").unwrap().is_empty());
        assert!(split_commands(" ;\n ; ").unwrap().is_empty());
    }
}
