//! A forward-only line cursor over a text stream with the handful of
//! tokenizing helpers every section reader needs.

use std::io::{BufRead, ErrorKind};

use xtal::{ANGBOHR, Vec3};

use crate::ParseError;

pub struct LineReader<R> {
    input: R,
    line: Option<String>,
    prev: Option<String>,
    line_number: usize,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            line: None,
            prev: None,
            line_number: 0,
        }
    }

    /// advance to the next line, returning `false` once the input is
    /// exhausted
    pub fn next_line(&mut self) -> Result<bool, ParseError> {
        let mut buf = String::new();
        let n = self.input.read_line(&mut buf)?;
        self.prev = self.line.take();
        if n == 0 {
            return Ok(false);
        }
        while buf.ends_with(['\n', '\r']) {
            buf.pop();
        }
        self.line_number += 1;
        self.line = Some(buf);
        Ok(true)
    }

    /// the current line, or the empty string past the end of the input
    pub fn line(&self) -> &str {
        self.line.as_deref().unwrap_or_default()
    }

    /// the line before the current one
    pub fn prev_line(&self) -> &str {
        self.prev.as_deref().unwrap_or_default()
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn contains(&self, pat: &str) -> bool {
        self.line.as_ref().is_some_and(|l| l.contains(pat))
    }

    pub fn tokens(&self) -> Vec<&str> {
        self.line().split_whitespace().collect()
    }

    /// advance `n` lines, stopping quietly at the end of the input
    pub fn skip(&mut self, n: usize) -> Result<(), ParseError> {
        for _ in 0..n {
            if !self.next_line()? {
                break;
            }
        }
        Ok(())
    }

    /// advance until the current line contains `pat`, returning `false` if the
    /// input ran out first
    pub fn discard_until_contains(
        &mut self,
        pat: &str,
    ) -> Result<bool, ParseError> {
        while self.next_line()? {
            if self.contains(pat) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn parse_float(&self, token: &str) -> Result<f64, ParseError> {
        token.parse().map_err(|_| ParseError::Float {
            line: self.line_number,
            token: token.to_owned(),
        })
    }

    pub fn parse_int(&self, token: &str) -> Result<usize, ParseError> {
        token.parse().map_err(|_| ParseError::Int {
            line: self.line_number,
            token: token.to_owned(),
        })
    }

    /// the `index`th whitespace-separated field of the current line
    pub fn field(&self, index: usize) -> Result<&str, ParseError> {
        self.line()
            .split_whitespace()
            .nth(index)
            .ok_or(ParseError::MissingField {
                line: self.line_number,
                index,
            })
    }

    pub fn float_field(&self, index: usize) -> Result<f64, ParseError> {
        self.parse_float(self.field(index)?)
    }

    /// the floats in fields `start..start + N` of the current line
    pub fn float_fields<const N: usize>(
        &self,
        start: usize,
    ) -> Result<[f64; N], ParseError> {
        let mut ret = [0.0; N];
        for (i, r) in ret.iter_mut().enumerate() {
            *r = self.float_field(start + i)?;
        }
        Ok(ret)
    }

    /// read three vectors from consecutive lines, taking the first three
    /// numbers on each. leading lines that do not start with a number are
    /// skipped, so this can be called from a header line
    pub fn read_vectors(&mut self, bohr: bool) -> Result<[Vec3; 3], ParseError> {
        while self.float_field(0).is_err() {
            if !self.next_line()? {
                return Err(ParseError::Io(
                    ErrorKind::UnexpectedEof,
                    "end of input while looking for vectors".to_owned(),
                ));
            }
        }
        let scale = if bohr { ANGBOHR } else { 1.0 };
        let mut ret = [Vec3::zeros(); 3];
        for (i, v) in ret.iter_mut().enumerate() {
            if i > 0 && !self.next_line()? {
                return Err(ParseError::Io(
                    ErrorKind::UnexpectedEof,
                    "end of input in the middle of three vectors".to_owned(),
                ));
            }
            let [x, y, z] = self.float_fields(0)?;
            *v = Vec3::new(x, y, z) * scale;
        }
        Ok(ret)
    }
}
