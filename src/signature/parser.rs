use crate::protocol::Type;
use crate::ty::Ty;

use super::{SignatureError, SignatureErrorKind, MAX_DEPTH, MAX_SIGNATURE};

/// Parse a signature which contains exactly one complete type.
///
/// # Examples
///
/// ```
/// use wirebus::signature::parse_one;
/// use wirebus::ty::Ty;
///
/// let ty = parse_one("aai")?;
/// assert!(matches!(ty, Ty::Array(..)));
///
/// assert!(parse_one("ii").is_err());
/// # Ok::<_, wirebus::SignatureError>(())
/// ```
pub fn parse_one(signature: &str) -> Result<Ty, SignatureError> {
    let mut parser = Parser::new(signature)?;

    if parser.at_end() {
        return Err(SignatureError::new(SignatureErrorKind::Empty));
    }

    let ty = parser.ty()?;

    if !parser.at_end() {
        return Err(SignatureError::new(SignatureErrorKind::Trailing(
            parser.rest().into(),
        )));
    }

    Ok(ty)
}

/// Parse a signature which contains any number of complete types, in order.
///
/// The empty signature parses into an empty sequence.
///
/// # Examples
///
/// ```
/// use wirebus::signature::parse_many;
///
/// assert_eq!(parse_many("")?.len(), 0);
/// assert_eq!(parse_many("susssasa{sv}i")?.len(), 8);
/// # Ok::<_, wirebus::SignatureError>(())
/// ```
pub fn parse_many(signature: &str) -> Result<Vec<Ty>, SignatureError> {
    let mut parser = Parser::new(signature)?;
    let mut types = Vec::new();

    while !parser.at_end() {
        types.push(parser.ty()?);
    }

    Ok(types)
}

struct Parser<'a> {
    bytes: &'a [u8],
    at: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(signature: &'a str) -> Result<Self, SignatureError> {
        if signature.len() > MAX_SIGNATURE {
            return Err(SignatureError::new(SignatureErrorKind::TooLong(
                signature.len(),
            )));
        }

        Ok(Self {
            bytes: signature.as_bytes(),
            at: 0,
            depth: 0,
        })
    }

    fn at_end(&self) -> bool {
        self.at == self.bytes.len()
    }

    fn rest(&self) -> &'a str {
        // Only ASCII type codes have been consumed, so the remainder starts
        // at a character boundary.
        std::str::from_utf8(&self.bytes[self.at..]).unwrap_or("")
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.at).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.at += 1;
        Some(b)
    }

    fn enter(&mut self) -> Result<(), SignatureError> {
        self.depth += 1;

        if self.depth > MAX_DEPTH {
            return Err(SignatureError::new(SignatureErrorKind::TooDeep));
        }

        Ok(())
    }

    /// Parse one complete type at the cursor. The caller has checked that
    /// input remains.
    fn ty(&mut self) -> Result<Ty, SignatureError> {
        let Some(b) = self.bump() else {
            return Err(SignatureError::new(SignatureErrorKind::Empty));
        };

        match b {
            b'y' | b'b' | b'n' | b'q' | b'i' | b'u' | b'x' | b't' | b'd' | b's' | b'o'
            | b'g' | b'h' => Ok(Ty::Primitive(Type(b))),
            b'v' => Ok(Ty::Variant),
            b'a' => {
                self.enter()?;

                let element = match self.peek() {
                    None => {
                        return Err(SignatureError::new(
                            SignatureErrorKind::MissingArrayElement,
                        ));
                    }
                    Some(b'{') => {
                        self.at += 1;
                        self.dict_entry()?
                    }
                    Some(..) => self.ty()?,
                };

                self.depth -= 1;
                Ok(Ty::Array(Box::new(element)))
            }
            b'(' => {
                self.enter()?;
                let st = self.fields()?;
                self.depth -= 1;
                Ok(st)
            }
            b'{' => Err(SignatureError::new(SignatureErrorKind::DictOutsideArray)),
            other => Err(SignatureError::new(SignatureErrorKind::UnknownType(
                other as char,
            ))),
        }
    }

    /// Parse struct fields after the opening parenthesis.
    fn fields(&mut self) -> Result<Ty, SignatureError> {
        let mut fields = Vec::new();

        loop {
            match self.peek() {
                None => {
                    return Err(SignatureError::new(SignatureErrorKind::UnexpectedEnd(')')));
                }
                Some(b')') => {
                    self.at += 1;
                    break;
                }
                Some(..) => fields.push(self.ty()?),
            }
        }

        if fields.is_empty() {
            return Err(SignatureError::new(SignatureErrorKind::EmptyStruct));
        }

        Ok(Ty::Struct(fields))
    }

    /// Parse a dict entry after the opening brace of an `a{`.
    fn dict_entry(&mut self) -> Result<Ty, SignatureError> {
        let mut inner = Vec::new();

        loop {
            match self.peek() {
                None => {
                    return Err(SignatureError::new(SignatureErrorKind::UnexpectedEnd('}')));
                }
                Some(b'}') => {
                    self.at += 1;
                    break;
                }
                Some(..) => inner.push(self.ty()?),
            }
        }

        if inner.len() != 2 {
            return Err(SignatureError::new(SignatureErrorKind::DictArity(
                inner.len(),
            )));
        }

        let value = inner.pop().map(Box::new);
        let key = inner.pop().map(Box::new);

        match (key, value) {
            (Some(key), Some(value)) => {
                if !key.is_basic() {
                    return Err(SignatureError::new(SignatureErrorKind::DictKeyNotBasic));
                }

                Ok(Ty::DictEntry(key, value))
            }
            // Unreachable since the length was checked to be 2.
            _ => Err(SignatureError::new(SignatureErrorKind::DictArity(0))),
        }
    }
}
