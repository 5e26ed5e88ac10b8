use super::*;

fn palette() -> PaletteIndex {
    PaletteIndex::new(["red", "green", "blue", "white"]).unwrap()
}

#[test]
fn test_codes_follow_list_order() {
    let palette = palette();
    assert_eq!(palette.len(), 4);
    assert_eq!(palette.color_to_code("red").unwrap(), 0);
    assert_eq!(palette.color_to_code("white").unwrap(), 3);
    assert_eq!(palette.code_to_color(2).unwrap(), "blue");
}

#[test]
fn test_every_color_maps_back() {
    let palette = palette();
    for color in palette.colors() {
        let code = palette.color_to_code(color).unwrap();
        assert_eq!(palette.code_to_color(code).unwrap(), color);
    }
}

#[test]
fn test_unknown_color() {
    assert!(matches!(palette().color_to_code("purple"), Err(SyncError::UnknownColor(c)) if c == "purple"));
}

#[test]
fn test_code_out_of_range() {
    assert!(matches!(
        palette().code_to_color(4),
        Err(SyncError::OutOfRange { code: 4, palette_size: 4 })
    ));
}

#[test]
fn test_invalid_palettes() {
    assert!(matches!(PaletteIndex::new(Vec::<String>::new()), Err(SyncError::Config(_))));
    assert!(matches!(PaletteIndex::new(["red", "blue", "red"]), Err(SyncError::Config(_))));
}

#[test]
fn test_palette_is_never_empty() {
    let palette = PaletteIndex::new(["black"]).unwrap();
    assert!(!palette.is_empty());
    assert_eq!(palette.len(), 1);
}
