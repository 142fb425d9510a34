use amba_transpiler::{EmbedOptions, ErrorKind, HtmlEmbedder, Options};

fn embedder() -> HtmlEmbedder {
    HtmlEmbedder::new(EmbedOptions::default(), Options::default()).unwrap()
}

#[test]
fn test_single_region() {
    let html = "<body>\n    <jiminy>\nnumbers = [1,2,3]\n    </jiminy>\n    <p>Regular content.</p>\n</body>\n";
    let output = embedder().embed(html).unwrap();

    assert_eq!(
        output,
        "<body>\n    <script>let numbers = [1, 2, 3];\n</script>\n    <p>Regular content.</p>\n</body>\n"
    );
    assert!(!output.contains("jiminy"));
}

#[test]
fn test_untagged_content_is_byte_identical() {
    let before = "<!DOCTYPE html>\n<html>\n<head><title>T</title></head>\n";
    let after = "\n<p>  spaced   text  </p>\n</html>\n";
    let html = format!("{}<jiminy>x = 1</jiminy>{}", before, after);

    let output = embedder().embed(&html).unwrap();
    assert!(output.starts_with(before));
    assert!(output.ends_with(after));
}

#[test]
fn test_indented_multiline_region() {
    let html = "<div>\n  <jiminy>\n    total = sum(numbers)\n    print(f'The sum is {total}')\n  </jiminy>\n</div>";
    let output = embedder().embed(html).unwrap();

    assert!(output.contains("<script>let total = sum(numbers);\nconsole.log(`The sum is ${total}`);\n</script>"));
}

#[test]
fn test_multiple_regions() {
    let html = "<jiminy>a = 1</jiminy><hr><jiminy>b = 2</jiminy>";
    let output = embedder().embed(html).unwrap();
    assert_eq!(output, "<script>let a = 1;\n</script><hr><script>let b = 2;\n</script>");
}

#[test]
fn test_custom_tag_and_template() {
    let embed = EmbedOptions {
        tag_name: "py".to_string(),
        template: "(() => {\n{}})();".to_string(),
    };
    let embedder = HtmlEmbedder::new(embed, Options::default()).unwrap();
    let output = embedder.embed("<py>x = 1</py><jiminy>y</jiminy>").unwrap();

    assert_eq!(output, "<script>(() => {\nlet x = 1;\n})();</script><jiminy>y</jiminy>");
}

#[test]
fn test_no_regions() {
    let html = "<html><body>plain</body></html>";
    assert_eq!(embedder().embed(html).unwrap(), html);
}

#[test]
fn test_macros_inside_region() {
    let html = "<jiminy>%innerHTML{\"#out\"}{\"ready\"}</jiminy>";
    let output = embedder().embed(html).unwrap();
    assert_eq!(output, "<script>document.querySelector('#out').innerHTML = 'ready';\n</script>");
}

#[test]
fn test_translation_error_aborts() {
    let err = embedder().embed("<p>ok</p><jiminy>class A:\n    pass\n</jiminy>").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedConstruct);
}
