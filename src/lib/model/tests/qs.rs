//! Tests for decoding call arguments from query strings.

use serde_qs::{self, from_str as from_qs};
use spectral::prelude::*;

use crate::model::{BlurArgs, ConvertArgs, MemeArgs, ResizeArgs, RotateArgs};


#[test]
fn numeric_args() {
    let blur: Result<BlurArgs, _> = from_qs("amount=3&url=http%3A%2F%2Fexample.com%2Fa.png");
    assert_that!(blur).is_ok().is_equal_to(BlurArgs{
        amount: 3.0, url: "http://example.com/a.png".into(),
    });

    let resize: Result<ResizeArgs, _> = from_qs("scale=0.25&url=http%3A%2F%2Fexample.com%2Fa.png");
    assert_that!(resize).is_ok().map(|r| &r.scale).is_equal_to(0.25);

    let rotate: Result<RotateArgs, _> = from_qs("angle=-90&url=http%3A%2F%2Fexample.com%2Fa.png");
    assert_that!(rotate).is_ok().map(|r| &r.angle).is_equal_to(-90.0);
}

#[test]
fn text_args() {
    let convert: Result<ConvertArgs, _> = from_qs("fileExt=gif&url=http%3A%2F%2Fexample.com%2Fa.png");
    assert_that!(convert).is_ok().map(|c| &c.file_ext).is_equal_to("gif".to_owned());

    let input = "topText=Need%20a%20meme%20%26%20text%3F&bottomText=&url=http%3A%2F%2Fexample.com%2Fa.png";
    let meme: Result<MemeArgs, _> = from_qs(input);
    assert_that!(meme).is_ok().is_equal_to(MemeArgs{
        top_text: "Need a meme & text?".into(),
        bottom_text: "".into(),
        url: "http://example.com/a.png".into(),
    });
}

#[test]
fn invalid() {
    let blur: Result<BlurArgs, serde_qs::Error> = from_qs("amount=a%20lot&url=x");
    assert_that!(blur).is_err();
    let resize: Result<ResizeArgs, serde_qs::Error> = from_qs("url=x");
    assert_that!(resize).is_err();
}
