use axum_test::TestResponse;

#[track_caller]
pub(crate) fn assert_content_type(response: &TestResponse, content_type: &str) {
    let content_type_header = response
        .maybe_header("content-type")
        .expect("content-type header missing");
    assert_eq!(content_type_header, content_type);
}

#[track_caller]
pub(crate) fn get_header(response: &TestResponse, header_name: &str) -> String {
    let header_error_message = format!("Headers missing {header_name}");

    response
        .maybe_header(header_name)
        .expect(&header_error_message)
        .to_str()
        .expect("Could not convert to str")
        .to_string()
}
