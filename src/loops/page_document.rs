//! Page document loop

use std::path::PathBuf;
use std::sync::Arc;

use sqlx::SqlitePool;

use super::args::LoopArgs;
use super::row::PageDocumentRow;
use super::LoopContext;
use crate::db::{DocumentQuery, PageDocument, PageDocumentRepository};
use crate::error::Result;
use crate::preview::PreviewPipeline;
use crate::processing::{DocumentProcessRequest, DocumentProcessor, PAGE_DOCUMENT_SUBDIRECTORY};

/// Lists the documents attached to pages, with processed file URLs and
/// first page previews
#[derive(Clone)]
pub struct PageDocumentLoop {
    pool: SqlitePool,
    document_processor: Arc<dyn DocumentProcessor>,
    pipeline: PreviewPipeline,
    documents_dir: PathBuf,
}

impl PageDocumentLoop {
    pub fn new(
        pool: SqlitePool,
        document_processor: Arc<dyn DocumentProcessor>,
        pipeline: PreviewPipeline,
        documents_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            pool,
            document_processor,
            pipeline,
            documents_dir: documents_dir.into(),
        }
    }

    /// Locale the rows are resolved in
    pub fn locale<'a>(args: &'a LoopArgs, ctx: &'a LoopContext) -> &'a str {
        args.lang.as_deref().unwrap_or(&ctx.locale)
    }

    pub fn build_query(args: &LoopArgs, ctx: &LoopContext) -> DocumentQuery {
        let mut query = DocumentQuery::new(Self::locale(args, ctx), ctx.default_locale.as_str());
        query.ids = args.id.clone();
        query.page_ids = args.page_id.clone();
        query.visible = args.visible.as_filter();
        query.orders = args.order.clone();
        query.limit = args.limit;
        query.offset = args.offset;
        query
    }

    /// Run the query and assemble one row per document, in query order.
    ///
    /// A document whose preview cannot be produced is still returned, with
    /// an empty preview source.
    pub async fn exec(&self, args: &LoopArgs, ctx: &LoopContext) -> Result<Vec<PageDocumentRow>> {
        let query = Self::build_query(args, ctx);
        let documents = PageDocumentRepository::new(&self.pool).find(&query).await?;

        tracing::debug!(
            count = documents.len(),
            locale = %query.locale,
            "Page documents matched"
        );

        let mut rows = Vec::with_capacity(documents.len());
        for document in documents {
            rows.push(self.assemble(document, &query.locale).await?);
        }

        Ok(rows)
    }

    async fn assemble(&self, document: PageDocument, locale: &str) -> Result<PageDocumentRow> {
        let Some(file) = document.file.clone() else {
            tracing::warn!(document_id = document.id, "Page document has no file");
            return Ok(PageDocumentRow::new(document, None, None));
        };

        let request = DocumentProcessRequest::new(
            self.documents_dir.join(&file),
            PAGE_DOCUMENT_SUBDIRECTORY,
        );
        let processed = self.document_processor.process_document(&request).await?;

        let preview = self.pipeline.preview_url(document.id, &file, locale).await?;

        Ok(PageDocumentRow::new(document, Some(processed.url), preview))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tempfile::TempDir;

    use crate::db::{
        seed_document, test_pool, CreatePageDocument, DocumentOrder, LibraryImageRepository,
        PageDocumentI18n,
    };
    use crate::error::AppError;
    use crate::loops::BooleanOrBoth;
    use crate::media::{AssetType, LibraryImageService, PreviewRegistry};
    use crate::preview::{FailingRasterizer, FakeRasterizer, PreviewError, Rasterizer};
    use crate::processing::{FileCacheProcessor, ProcessingError};

    const BASE_URL: &str = "https://shop.test";

    struct Fixture {
        temp_dir: TempDir,
        pool: SqlitePool,
        documents_dir: PathBuf,
        service: Arc<LibraryImageService>,
        processor: Arc<FileCacheProcessor>,
    }

    impl Fixture {
        async fn new() -> Self {
            let temp_dir = TempDir::new().unwrap();
            let documents_dir = temp_dir.path().join("documents");
            std::fs::create_dir_all(&documents_dir).unwrap();

            let pool = test_pool().await;
            let service = Arc::new(LibraryImageService::new(
                pool.clone(),
                temp_dir.path().join("library"),
            ));
            let processor = Arc::new(FileCacheProcessor::new(
                temp_dir.path().join("cache"),
                BASE_URL,
            ));

            Self {
                temp_dir,
                pool,
                documents_dir,
                service,
                processor,
            }
        }

        fn page_loop(&self, rasterizer: Arc<dyn Rasterizer>) -> PageDocumentLoop {
            let pipeline = PreviewPipeline::new(
                self.service.clone(),
                rasterizer,
                self.processor.clone(),
                &self.documents_dir,
                self.temp_dir.path().join("images"),
            );
            PageDocumentLoop::new(
                self.pool.clone(),
                self.processor.clone(),
                pipeline,
                &self.documents_dir,
            )
        }

        /// Seed a document row and write its file
        async fn document(&self, page_id: i64, visible: bool, position: i64, file: &str, title: &str) -> i64 {
            std::fs::write(self.documents_dir.join(file), b"%PDF-1.4").unwrap();
            seed_document(&self.pool, page_id, visible, position, file, title).await
        }

        async fn associations(&self, document_id: i64) -> i64 {
            LibraryImageRepository::new(&self.pool)
                .count_item_images(AssetType::DocumentPreview.as_str(), document_id)
                .await
                .unwrap()
        }
    }

    fn ctx() -> LoopContext {
        LoopContext::new("en_US", "en_US")
    }

    fn args(pairs: &[(&str, &str)]) -> LoopArgs {
        LoopArgs::from_pairs(pairs.iter().copied()).unwrap()
    }

    #[test]
    fn test_build_query_maps_arguments() {
        let query = PageDocumentLoop::build_query(
            &args(&[
                ("id", "1,2"),
                ("page_id", "7"),
                ("visible", "*"),
                ("order", "alpha,id"),
                ("lang", "fr_FR"),
                ("limit", "5"),
                ("offset", "10"),
            ]),
            &ctx(),
        );

        assert_eq!(query.ids, Some(vec![1, 2]));
        assert_eq!(query.page_ids, Some(vec![7]));
        assert_eq!(query.visible, None);
        assert_eq!(query.orders, vec![DocumentOrder::Alpha, DocumentOrder::Id]);
        assert_eq!(query.locale, "fr_FR");
        assert_eq!(query.default_locale, "en_US");
        assert_eq!(query.limit, Some(5));
        assert_eq!(query.offset, Some(10));

        let query = PageDocumentLoop::build_query(&LoopArgs::default(), &ctx());
        assert_eq!(query.locale, "en_US");
        assert_eq!(query.visible, Some(true));
    }

    #[tokio::test]
    async fn test_pdf_row_gets_document_path_and_preview() {
        let fixture = Fixture::new().await;
        let id = fixture.document(1, true, 1, "brochure.pdf", "Brochure").await;
        let rasterizer = Arc::new(FakeRasterizer::default());

        let rows = fixture
            .page_loop(rasterizer.clone())
            .exec(&LoopArgs::default(), &ctx())
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.id, id);
        assert_eq!(row.page_id, 1);
        assert!(row.visible);
        assert_eq!(
            row.page_document_path.as_deref(),
            Some("https://shop.test/cache/documents/page_document/brochure.pdf")
        );
        let preview = row.page_document_pdf_image_source.as_deref().unwrap();
        assert!(preview.starts_with("https://shop.test/cache/images/document_preview/"));
        assert_eq!(row.page_document_file.as_deref(), Some("brochure.pdf"));
        assert_eq!(row.page_document_title.as_deref(), Some("Brochure"));
        assert_eq!(row.page_document_chapo.as_deref(), Some("Brochure chapo"));
        assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fixture.associations(id).await, 1);
        assert!(fixture
            .temp_dir
            .path()
            .join("images/document_preview/brochure.pdf.jpg")
            .exists());
    }

    #[tokio::test]
    async fn test_existing_preview_is_reused() {
        let fixture = Fixture::new().await;
        let id = fixture.document(1, true, 1, "manual.pdf", "Manual").await;

        let stored = fixture.temp_dir.path().join("manual.pdf.jpg");
        image::RgbImage::from_pixel(4, 4, image::Rgb([10, 10, 10]))
            .save_with_format(&stored, image::ImageFormat::Jpeg)
            .unwrap();
        fixture
            .service
            .record_new_preview(&stored, "manual.pdf", "en_US", AssetType::DocumentPreview, id)
            .await
            .unwrap();

        let rasterizer = Arc::new(FakeRasterizer::default());
        let page_loop = fixture.page_loop(rasterizer.clone());
        let first = page_loop.exec(&LoopArgs::default(), &ctx()).await.unwrap();
        let second = page_loop.exec(&LoopArgs::default(), &ctx()).await.unwrap();

        assert!(first[0].page_document_pdf_image_source.is_some());
        assert_eq!(first, second);
        assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(fixture.associations(id).await, 1);
    }

    #[tokio::test]
    async fn test_non_pdf_row_has_path_without_preview() {
        let fixture = Fixture::new().await;
        fixture.document(1, true, 1, "terms.docx", "Terms").await;
        let rasterizer = Arc::new(FakeRasterizer::default());

        let rows = fixture
            .page_loop(rasterizer.clone())
            .exec(&LoopArgs::default(), &ctx())
            .await
            .unwrap();

        assert_eq!(
            rows[0].page_document_path.as_deref(),
            Some("https://shop.test/cache/documents/page_document/terms.docx")
        );
        assert_eq!(rows[0].page_document_pdf_image_source, None);
        assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rows_follow_query_order() {
        let fixture = Fixture::new().await;
        let b = fixture.document(1, true, 1, "b.docx", "Banana").await;
        let a = fixture.document(1, true, 2, "a.docx", "Apple").await;
        let c = fixture.document(1, true, 3, "c.docx", "Cherry").await;
        let page_loop = fixture.page_loop(Arc::new(FakeRasterizer::default()));

        let ids = |rows: Vec<PageDocumentRow>| rows.into_iter().map(|r| r.id).collect::<Vec<_>>();

        let rows = page_loop.exec(&args(&[("order", "alpha-reverse")]), &ctx()).await.unwrap();
        assert_eq!(ids(rows), vec![c, b, a]);

        let rows = page_loop.exec(&args(&[("order", "alpha")]), &ctx()).await.unwrap();
        assert_eq!(ids(rows), vec![a, b, c]);

        let rows = page_loop.exec(&LoopArgs::default(), &ctx()).await.unwrap();
        assert_eq!(ids(rows), vec![b, a, c]);
    }

    #[tokio::test]
    async fn test_visibility_filter() {
        let fixture = Fixture::new().await;
        fixture.document(1, true, 1, "shown.docx", "Shown").await;
        let hidden = fixture.document(1, false, 2, "hidden.docx", "Hidden").await;
        let page_loop = fixture.page_loop(Arc::new(FakeRasterizer::default()));

        let rows = page_loop.exec(&LoopArgs::default(), &ctx()).await.unwrap();
        assert_eq!(rows.len(), 1);

        let mut both = LoopArgs::default();
        both.visible = BooleanOrBoth::Both;
        assert_eq!(page_loop.exec(&both, &ctx()).await.unwrap().len(), 2);

        let rows = page_loop.exec(&args(&[("visible", "no")]), &ctx()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, hidden);
        assert!(!rows[0].visible);
    }

    #[tokio::test]
    async fn test_failed_preview_still_emits_row() {
        let fixture = Fixture::new().await;
        let broken = fixture.document(1, true, 1, "broken.pdf", "Broken").await;
        let fine = fixture.document(1, true, 2, "fine.docx", "Fine").await;
        let rasterizer = Arc::new(FailingRasterizer {
            directory: false,
            calls: AtomicUsize::new(0),
        });

        let rows = fixture
            .page_loop(rasterizer.clone())
            .exec(&LoopArgs::default(), &ctx())
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, broken);
        assert_eq!(rows[0].page_document_pdf_image_source, None);
        assert!(rows[0].page_document_path.is_some());
        assert_eq!(rows[0].page_document_title.as_deref(), Some("Broken"));
        assert_eq!(rows[1].id, fine);
        assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fixture.associations(broken).await, 0);
    }

    #[tokio::test]
    async fn test_directory_creation_error_aborts() {
        let fixture = Fixture::new().await;
        fixture.document(1, true, 1, "brochure.pdf", "Brochure").await;
        let page_loop = fixture.page_loop(Arc::new(FailingRasterizer {
            directory: true,
            calls: AtomicUsize::new(0),
        }));

        let result = page_loop.exec(&LoopArgs::default(), &ctx()).await;
        assert!(matches!(
            result,
            Err(AppError::Preview(PreviewError::DirectoryCreation { .. }))
        ));
    }

    #[tokio::test]
    async fn test_missing_document_file_aborts() {
        let fixture = Fixture::new().await;
        fixture.document(1, true, 1, "gone.docx", "Gone").await;
        std::fs::remove_file(fixture.documents_dir.join("gone.docx")).unwrap();
        let page_loop = fixture.page_loop(Arc::new(FakeRasterizer::default()));

        let result = page_loop.exec(&LoopArgs::default(), &ctx()).await;
        assert!(matches!(
            result,
            Err(AppError::Processing(ProcessingError::SourceNotFound(ref path)))
                if path == &fixture.documents_dir.join("gone.docx")
        ));
    }

    #[tokio::test]
    async fn test_document_without_file() {
        let fixture = Fixture::new().await;
        let id = crate::db::PageDocumentRepository::new(&fixture.pool)
            .create(&CreatePageDocument {
                page_id: 1,
                visible: true,
                position: 1,
            })
            .await
            .unwrap();
        let rasterizer = Arc::new(FakeRasterizer::default());

        let rows = fixture
            .page_loop(rasterizer.clone())
            .exec(&LoopArgs::default(), &ctx())
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, id);
        assert_eq!(rows[0].page_document_file, None);
        assert_eq!(rows[0].page_document_path, None);
        assert_eq!(rows[0].page_document_pdf_image_source, None);
        assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_lang_argument_overrides_request_locale() {
        let fixture = Fixture::new().await;
        let id = fixture.document(1, true, 1, "guide.docx", "Guide").await;
        PageDocumentRepository::new(&fixture.pool)
            .upsert_i18n(
                id,
                "fr_FR",
                &PageDocumentI18n {
                    title: Some("Guide FR".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let page_loop = fixture.page_loop(Arc::new(FakeRasterizer::default()));

        let rows = page_loop.exec(&args(&[("lang", "fr-FR")]), &ctx()).await.unwrap();
        assert_eq!(rows[0].page_document_title.as_deref(), Some("Guide FR"));
        assert_eq!(rows[0].page_document_file.as_deref(), Some("guide.docx"));

        let rows = page_loop
            .exec(&LoopArgs::default(), &LoopContext::new("fr_FR", "en_US"))
            .await
            .unwrap();
        assert_eq!(rows[0].page_document_title.as_deref(), Some("Guide FR"));
    }

    #[tokio::test]
    async fn test_preview_registered_in_request_locale() {
        let fixture = Fixture::new().await;
        let id = fixture.document(1, true, 1, "flyer.pdf", "Flyer").await;
        let page_loop = fixture.page_loop(Arc::new(FakeRasterizer::default()));

        page_loop
            .exec(&LoopArgs::default(), &LoopContext::new("de_DE", "en_US"))
            .await
            .unwrap();

        let asset = fixture
            .service
            .find_existing_preview(AssetType::DocumentPreview, id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(asset.association.locale, "de_DE");
        assert!(asset
            .image_path(Path::new("/library"), "de_DE")
            .unwrap()
            .ends_with(format!("{}-flyer.pdf.jpg", asset.image_id())));
    }
}
