//! Module handling the command line arguments
//! that give the parameters of an operation.

use std::collections::BTreeMap;
use std::env;
use std::path::Path;

use pixl::{ArgsSource, Call, Operation};
use serde::de::DeserializeOwned;
use serde_qs;
use thiserror::Error;
use url::Url;


/// Name of the parameter with the location of the source image.
const URL_PARAM: &str = "url";


/// Parse the PARAM arguments of given operation into a `Call`.
///
/// Each argument is either NAME=VALUE, or just a VALUE that goes to the next parameter
/// in the operation's order. Image locations can be plain file paths.
pub fn parse<'a, I>(op: Operation, args: I) -> Result<Call, Error>
    where I: IntoIterator<Item=&'a str>
{
    let names = op.params();
    let mut params = BTreeMap::new();
    let mut positional = 0;

    for arg in args {
        let (name, value) = match arg.find('=') {
            Some(i) => {
                let name = arg[..i].trim();
                if name.is_empty() {
                    return Err(Error::Syntax(arg.to_owned()));
                }
                let canonical = names.iter().find(|&&n| normalize(n) == normalize(name))
                    .ok_or_else(|| Error::Unknown{
                        name: name.to_owned(), operation: op, expected: names.join(", "),
                    })?;
                (*canonical, &arg[i + 1..])
            }
            None => {
                let name = names.get(positional).ok_or_else(|| Error::Excess(arg.to_owned()))?;
                positional += 1;
                (*name, arg)
            }
        };
        trace!("Parameter {} = {:?}", name, value);
        if params.insert(name.to_owned(), value.to_owned()).is_some() {
            return Err(Error::Duplicate(name.to_owned()));
        }
    }

    if let Some(url) = params.get_mut(URL_PARAM) {
        *url = source_url(url)?;
    }
    Call::decode(op, Params(params)).map_err(Error::Decode)
}

#[inline]
fn normalize(name: &str) -> String {
    name.replace('_', "").to_lowercase()
}

/// Turn the location of the source image into a URL.
/// Anything that isn't already an URL is treated as a local file path.
fn source_url(location: &str) -> Result<String, Error> {
    if location.trim().is_empty() || location.contains("://") {
        return Ok(location.to_owned());
    }
    let path = Path::new(location);
    let path = if path.is_absolute() {
        path.to_owned()
    } else {
        env::current_dir()
            .map_err(|_| Error::Path(location.to_owned()))?
            .join(path)
    };
    Url::from_file_path(&path)
        .map(|u| u.to_string())
        .map_err(|_| Error::Path(location.to_owned()))
}


/// Parameters as a source of call arguments.
///
/// They are decoded in the same way as a query string would be,
/// so numbers given as text are accepted.
struct Params(BTreeMap<String, String>);

impl ArgsSource for Params {
    type Error = serde_qs::Error;

    fn args<T: DeserializeOwned>(self) -> Result<T, Self::Error> {
        let query = serde_qs::to_string(&self.0)?;
        serde_qs::from_str(&query)
    }
}


/// Error that can occur when parsing the parameters of an operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Parameter not in the NAME=VALUE form.
    #[error("invalid parameter `{0}`, expected NAME=VALUE")]
    Syntax(String),
    /// Parameter that the operation doesn't have.
    #[error("{operation} has no parameter `{name}` (expected one of: {expected})")]
    Unknown { name: String, operation: Operation, expected: String },
    /// More positional values than the operation has parameters.
    #[error("too many parameters, `{0}` is extraneous")]
    Excess(String),
    /// The same parameter given twice.
    #[error("parameter `{0}` given more than once")]
    Duplicate(String),
    /// Image location that cannot be made into a URL.
    #[error("cannot use `{0}` as image location")]
    Path(String),
    /// Parameter values of wrong type, or missing parameters.
    #[error("invalid parameters: {0}")]
    Decode(#[source] serde_qs::Error),
}


#[cfg(test)]
mod tests {
    use std::env;
    use pixl::{Call, MemeArgs, Operation, ResizeArgs, RotateArgs};
    use spectral::prelude::*;
    use super::{parse, Error};

    #[test]
    fn named() {
        let call = parse(Operation::Resize, vec!["scale=0.5", "url=http://example.com/cat.jpg"]);
        assert_that!(call).is_ok().is_equal_to(Call::Resize(ResizeArgs{
            scale: 0.5, url: "http://example.com/cat.jpg".into(),
        }));
    }

    #[test]
    fn names_are_flexible() {
        let call = parse(Operation::MemeGenerate, vec![
            "top_text=Hello there", "BOTTOMTEXT=", "url=http://example.com/a.png"]);
        assert_that!(call).is_ok().is_equal_to(Call::MemeGenerate(MemeArgs{
            top_text: "Hello there".into(),
            bottom_text: "".into(),
            url: "http://example.com/a.png".into(),
        }));
    }

    #[test]
    fn positional() {
        let call = parse(Operation::Rotate, vec!["-90", "https://example.com/cat.jpg"]);
        assert_that!(call).is_ok().is_equal_to(Call::Rotate(RotateArgs{
            angle: -90.0, url: "https://example.com/cat.jpg".into(),
        }));
    }

    #[test]
    fn value_with_equals_sign() {
        let call = parse(Operation::MemeGenerate, vec![
            "topText=1+1=2", "bottomText=QED", "url=http://example.com/a.png?x=y"]).unwrap();
        match call {
            Call::MemeGenerate(ref args) => {
                assert_eq!("1+1=2", args.top_text);
                assert_eq!("http://example.com/a.png?x=y", args.url);
            }
            ref c => panic!("unexpected call: {:?}", c),
        }
    }

    #[test]
    fn local_path() {
        let call = parse(Operation::Blur, vec!["amount=2", "url=/tmp/cat.png"]).unwrap();
        assert_eq!("file:///tmp/cat.png", call.url());

        let call = parse(Operation::Blur, vec!["2", "cat.png"]).unwrap();
        let expected = url::Url::from_file_path(env::current_dir().unwrap().join("cat.png")).unwrap();
        assert_eq!(expected.as_str(), call.url());
    }

    #[test]
    fn errors() {
        match parse(Operation::Blur, vec!["=2"]) {
            Err(Error::Syntax(..)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        match parse(Operation::Blur, vec!["radius=2", "url=http://x/y.png"]) {
            Err(Error::Unknown{ref name, ..}) => assert_eq!("radius", name),
            other => panic!("unexpected result: {:?}", other),
        }
        match parse(Operation::Blur, vec!["2", "http://x/y.png", "extra"]) {
            Err(Error::Excess(ref arg)) => assert_eq!("extra", arg),
            other => panic!("unexpected result: {:?}", other),
        }
        match parse(Operation::Blur, vec!["amount=2", "amount=3"]) {
            Err(Error::Duplicate(ref name)) => assert_eq!("amount", name),
            other => panic!("unexpected result: {:?}", other),
        }
        match parse(Operation::Blur, vec!["amount=lots", "url=http://x/y.png"]) {
            Err(Error::Decode(..)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        // Missing parameter.
        assert_that!(parse(Operation::Convert, vec!["url=http://x/y.png"])).is_err();
    }
}
