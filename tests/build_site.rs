//! End-to-end builds of small blogs written into a temp directory.

use blogbake::build::{self, ManifestEntry};
use blogbake::config::{self, BlogConfig};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head><title></title><link rel="stylesheet" href="../css/site.css"></head>
<body><p id="title"></p><div id="content"></div></body>
</html>
"#;

const INDEX_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Blog</title><link rel="stylesheet" href="css/site.css"></head>
<body><div id="content"></div></body>
</html>
"#;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn png(path: &Path, width: u32, height: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    image::RgbImage::new(width, height).save(path).unwrap();
}

/// A blog with the templates, icons and stylesheet every build needs, and
/// the given `index.xml` entries.
fn blog(entries: &str) -> (TempDir, BlogConfig) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(&root.join("blog.toml"), "folders_to_copy = [\"css\"]\n");
    let content = root.join("content");
    write(
        &content.join("index.xml"),
        &format!("<blog><chapters>{entries}</chapters></blog>"),
    );
    write(&content.join("index.html"), INDEX_TEMPLATE);
    write(&content.join("page.html"), PAGE_TEMPLATE);
    write(&content.join("css/site.css"), "body { margin: 0; }\n");
    for icon in ["previous", "next", "minibus", "empty"] {
        write(&content.join(format!("images/icons/{icon}.svg")), "<svg/>");
    }
    let config = config::load_config(&root.join("blog.toml")).unwrap();
    (tmp, config)
}

fn manifest(config: &BlogConfig) -> Vec<ManifestEntry> {
    let json = fs::read_to_string(config.html_root.join(&config.manifest)).unwrap();
    serde_json::from_str(&json).unwrap()
}

#[test]
fn single_page_chapter_with_inline_image() {
    let (_tmp, config) = blog(r#"<chapter link="intro" icon="minibus.svg">Intro</chapter>"#);
    write(
        &config.source_root.join("intro/page1.xml"),
        r#"<page><img location="left">map.png</img><txt>Where we went.</txt></page>"#,
    );
    png(&config.images_root().join("maps/map.png"), 80, 60);

    let summary = build::build(&config, false).unwrap();

    assert_eq!(summary.page_count(), 1);
    assert_eq!(summary.chapters[0].pages, vec!["intro/page1.html"]);
    assert!(!config.html_root.join("intro/page2.html").exists());

    let page = fs::read_to_string(config.html_root.join("intro/page1.html")).unwrap();
    assert!(page.contains("<title>Intro</title>"));
    assert!(page.contains(r#"<a class="float-right" href="../index.html">"#));
    assert!(!page.contains(r#"<p class="flex">"#));
    assert!(page.contains(r#"<span class="image-left"><img class="zoom scale" src="../images/maps/map.png"></span>"#));

    let entries = manifest(&config);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].link, "intro/page1.html");
    assert_eq!(entries[0].title, "Intro");

    let css = fs::read_to_string(config.html_root.join(&config.layout_css)).unwrap();
    assert!(!css.contains("scale"));
    assert_eq!(summary.layout_rules, 0);
    assert!(config.html_root.join("images/maps/map.png").is_file());
}

#[test]
fn three_page_chapter_navigation() {
    let (_tmp, config) = blog(r#"<chapter link="trip" icon="minibus.svg">Trip</chapter>"#);
    for n in 1..=3 {
        write(
            &config.source_root.join(format!("trip/page{n}.xml")),
            &format!("<page><txt>Day {n}</txt></page>"),
        );
    }

    build::build(&config, false).unwrap();
    let read = |n: usize| {
        fs::read_to_string(config.html_root.join(format!("trip/page{n}.html"))).unwrap()
    };

    let first = read(1);
    assert!(first.contains("<title>Trip 1</title>"));
    assert!(first.contains(r#"<a class="left"><img class="icon" src="../images/icons/empty.svg"></a>"#));
    assert!(first.contains(r#"<a class="right" href="./page2.html">"#));

    let middle = read(2);
    assert!(middle.contains(r#"<a class="left" href="./page1.html">"#));
    assert!(middle.contains(r#"<a class="right" href="./page3.html">"#));

    let last = read(3);
    assert!(last.contains(r#"<a class="left" href="./page2.html">"#));
    assert!(last.contains(r#"<a class="right"><img class="icon" src="../images/icons/empty.svg"></a>"#));
    assert!(last.contains(r#"<a class="center" href="../index.html">"#));
}

#[test]
fn proportional_row_and_stylesheet() {
    let (_tmp, config) = blog(r#"<chapter link="trip" icon="minibus.svg">Trip</chapter>"#);
    write(
        &config.source_root.join("trip/page1.xml"),
        "<page><img>a.png</img><img>b.png</img><txt>Pair</txt></page>",
    );
    png(&config.images_root().join("a.png"), 100, 100);
    png(&config.images_root().join("b.png"), 200, 100);

    build::build(&config, false).unwrap();

    let page = fs::read_to_string(config.html_root.join("trip/page1.html")).unwrap();
    assert!(page.contains(r#"<div class="scale1-3-2"><img class="zoom scale" src="../images/a.png"></div>"#));
    assert!(page.contains(r#"<div class="scale2-3-2"><img class="zoom scale" src="../images/b.png"></div>"#));

    let css = fs::read_to_string(config.html_root.join(&config.layout_css)).unwrap();
    assert!(css.contains("div.scale1-3-2 {\n  width: calc(1*(100% - 10px) / 3);\n  object-fit: contain;\n}"));
    assert!(css.contains("div.scale2-3-2 {\n  width: calc(2*(100% - 10px) / 3);"));
}

#[test]
fn stylesheet_is_renamed_everywhere() {
    let (_tmp, config) = blog(r#"<chapter link="trip" icon="minibus.svg">Trip</chapter>"#);
    write(
        &config.source_root.join("trip/page1.xml"),
        "<page><txt>Hi</txt></page>",
    );

    build::build(&config, false).unwrap();

    let renamed: Vec<String> = fs::read_dir(config.html_root.join("css"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with("site-") && n.ends_with(".css"))
        .collect();
    assert_eq!(renamed.len(), 1);

    let home = fs::read_to_string(config.html_root.join("index.html")).unwrap();
    let page = fs::read_to_string(config.html_root.join("trip/page1.html")).unwrap();
    assert!(home.contains(&format!(r#"href="css/{}""#, renamed[0])));
    assert!(page.contains(&format!(r#"href="../css/{}""#, renamed[0])));
    assert!(!home.contains("site.css"));
}

#[test]
fn rebuild_is_deterministic() {
    let (_tmp, config) = blog(r#"<chapter link="trip" icon="minibus.svg">Trip</chapter>"#);
    write(
        &config.source_root.join("trip/page1.xml"),
        "<page><txt>Hi</txt></page>",
    );

    build::build(&config, true).unwrap();
    let first = fs::read_to_string(config.html_root.join("index.html")).unwrap();
    build::build(&config, true).unwrap();
    let second = fs::read_to_string(config.html_root.join("index.html")).unwrap();
    assert_eq!(first, second);
}
