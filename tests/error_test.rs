use std::io;

use confspawn::error::Error;

#[test]
fn test_error_conversion() {
    let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let err: Error = io_err.into();

    match err {
        Error::IoError(_) => (),
        _ => panic!("Expected IoError variant"),
    }
}

#[test]
fn test_error_display() {
    let err = Error::ValidationError("recipe requires a 'config' path".to_string());
    assert_eq!(err.to_string(), "Validation error: recipe requires a 'config' path");

    let err = Error::CollisionError {
        first_root: "/src/shared".to_string(),
        second_root: "/src/prod".to_string(),
        relative_path: "app.conf".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Path collision: 'app.conf' is provided by both '/src/shared' and '/src/prod'"
    );

    let err = Error::UnresolvedPlaceholderError {
        key: "db.host".to_string(),
        template: "confspawn_app.conf".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Unresolved placeholder 'db.host' in template 'confspawn_app.conf'"
    );
}
