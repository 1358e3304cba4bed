mod html_roundtrip;
mod json_roundtrip;
