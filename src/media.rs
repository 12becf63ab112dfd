use std::path::Path;

use uuid::Uuid;

/// Directory under the media root that holds post images
pub const POST_IMAGES_DIR: &str = "posts_images";

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// A file received in a multipart form
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Lowercased extension of an accepted image file name.
pub fn image_extension(filename: &str) -> Option<String> {
    let extension = Path::new(filename)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    IMAGE_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

/// Stores an uploaded image under a fresh name and returns its path
/// relative to `media_root`. The name the client sent is never used on disk.
pub async fn save_image(media_root: &str, upload: &Upload) -> std::io::Result<String> {
    let extension = image_extension(&upload.filename).ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "unsupported image type")
    })?;

    let dir = Path::new(media_root).join(POST_IMAGES_DIR);
    tokio::fs::create_dir_all(&dir).await?;

    let name = format!("{}.{}", Uuid::new_v4(), extension);
    tokio::fs::write(dir.join(&name), &upload.bytes).await?;

    Ok(format!("{}/{}", POST_IMAGES_DIR, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("cat.png", Some("png"))]
    #[case("Photo.JPG", Some("jpg"))]
    #[case("anim.webp", Some("webp"))]
    #[case("script.php", None)]
    #[case("noextension", None)]
    #[case("archive.tar.gz", None)]
    fn accepted_extensions(#[case] filename: &str, #[case] expected: Option<&str>) {
        assert_eq!(image_extension(filename).as_deref(), expected);
    }

    #[tokio::test]
    async fn saves_under_generated_name() {
        let root = std::env::temp_dir().join(format!("blogicum-media-{}", Uuid::new_v4()));
        let root = root.to_string_lossy().to_string();
        let upload = Upload {
            filename: "../../etc/passwd.png".to_string(),
            bytes: vec![1, 2, 3],
        };

        let path = save_image(&root, &upload).await.unwrap();

        assert!(path.starts_with("posts_images/"));
        assert!(path.ends_with(".png"));
        assert!(!path.contains(".."));
        let stored = tokio::fs::read(Path::new(&root).join(&path)).await.unwrap();
        assert_eq!(stored, vec![1, 2, 3]);

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }
}
