#[cfg(test)]
pub mod test {
    use std::cell::RefCell;
    use std::io::{self, Write};
    use std::rc::Rc;

    use crate::error::ParseError;
    use crate::value::{FlagValue, Scalar, parse_signed};

    /// An output sink that tests can read back after handing a clone to a
    /// flag set.
    #[derive(Debug, Clone, Default)]
    pub struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl SharedBuf {
        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.borrow()).into_owned()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Panic payload standing in for a process exit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ExitCalled(pub i32);

    pub fn fake_exit(code: i32) -> ! {
        std::panic::panic_any(ExitCalled(code))
    }

    // -- Custom handle reporting a primitive ------------------------------------

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct CustomInt(pub isize);

    impl FlagValue for CustomInt {
        fn render(&self) -> String {
            self.0.to_string()
        }

        fn parse(&mut self, text: &str) -> Result<(), ParseError> {
            let v = parse_signed(text, "custom")?;
            self.0 = isize::try_from(v).map_err(|e| ParseError::new(text, "custom", e))?;
            Ok(())
        }

        fn current(&self) -> Scalar {
            Scalar::Int(self.0)
        }
    }

    // -- Custom enumerated handle -----------------------------------------------

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Level {
        Debug,
        Info,
        Warn,
    }

    impl FlagValue for Level {
        fn render(&self) -> String {
            match self {
                Level::Debug => "debug",
                Level::Info => "info",
                Level::Warn => "warn",
            }
            .to_string()
        }

        fn parse(&mut self, text: &str) -> Result<(), ParseError> {
            *self = match text {
                "debug" => Level::Debug,
                "info" => Level::Info,
                "warn" => Level::Warn,
                _ => return Err(ParseError::new(text, "level", "expected debug, info or warn")),
            };
            Ok(())
        }

        fn current(&self) -> Scalar {
            Scalar::Other(self.render())
        }
    }
}
