//! # Bookstore Service
//!
//! The gRPC handler answering both `bookstore.Inventory` and `bookstore.Echo`.
//!
//! Neither method can fail: `GetBooks` always answers with the sample inventory and `Echo`
//! returns its input unchanged.
use bookstore_proto::pb::{Book, EchoMessage, GetBooksRequest, GetBooksResponse};
use bookstore_proto::{Echo, Inventory};
use std::sync::LazyLock;
use tonic::{Request, Response, Status};

static SAMPLE_BOOKS: LazyLock<Vec<Book>> = LazyLock::new(|| {
    vec![
        book(412, "Dune", "Herbert, Frank"),
        book(256, "Dune Messiah", "Herbert, Frank"),
        book(232, "Children of Dune", "Herbert, Frank"),
    ]
});

fn book(pages: u32, title: &str, author: &str) -> Book {
    Book {
        pages,
        title: title.to_string(),
        author: author.to_string(),
    }
}

/// The fixed inventory, in the order `GetBooks` returns it.
pub fn sample_books() -> &'static [Book] {
    &SAMPLE_BOOKS
}

/// Stateless implementation of both bookstore services.
#[derive(Debug, Default, Clone, Copy)]
pub struct BookstoreService;

#[tonic::async_trait]
impl Inventory for BookstoreService {
    async fn get_books(
        &self,
        _request: Request<GetBooksRequest>,
    ) -> Result<Response<GetBooksResponse>, Status> {
        tracing::info!(books = SAMPLE_BOOKS.len(), "received GetBooks request");

        Ok(Response::new(GetBooksResponse {
            books: sample_books().to_vec(),
        }))
    }
}

#[tonic::async_trait]
impl Echo for BookstoreService {
    async fn echo(&self, request: Request<EchoMessage>) -> Result<Response<EchoMessage>, Status> {
        let EchoMessage { value } = request.into_inner();
        tracing::debug!(len = value.len(), "received Echo request");

        Ok(Response::new(EchoMessage { value }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_books_returns_sample_inventory_in_order() {
        let response = BookstoreService
            .get_books(Request::new(GetBooksRequest {}))
            .await
            .unwrap()
            .into_inner();

        let titles: Vec<_> = response.books.iter().map(|b| b.title.as_str()).collect();
        let pages: Vec<_> = response.books.iter().map(|b| b.pages).collect();

        assert_eq!(titles, ["Dune", "Dune Messiah", "Children of Dune"]);
        assert_eq!(pages, [412, 256, 232]);
        assert!(response.books.iter().all(|b| b.author == "Herbert, Frank"));
    }

    #[tokio::test]
    async fn get_books_is_idempotent() {
        for _ in 0..3 {
            let response = BookstoreService
                .get_books(Request::new(GetBooksRequest {}))
                .await
                .unwrap()
                .into_inner();

            assert_eq!(response.books, sample_books());
        }
    }

    #[tokio::test]
    async fn echo_returns_input_unchanged() {
        for value in ["hello", "", "  padded  ", "Muad'Dib", "line\nbreak"] {
            let response = BookstoreService
                .echo(Request::new(EchoMessage {
                    value: value.to_string(),
                }))
                .await
                .unwrap()
                .into_inner();

            assert_eq!(response.value, value);
        }
    }
}
