use proc_macro::TokenStream;

mod transactional;

/// Wraps an async method so its body runs inside a database transaction.
///
/// The method must live on a type with a `transaction_manager:
/// Arc<dyn TransactionManager>` field and return a `Result` whose error type
/// implements `From<RegistryError>`. `Ok` commits, `Err` rolls back.
///
/// Options:
/// - `read_only = true`
/// - `isolation = Serializable` (any `IsolationLevel` variant)
/// - `propagation = RequiresNew` (defaults to `Required`, which joins an
///   already active transaction)
///
/// # Example
/// ```ignore
/// #[transactional(read_only = true)]
/// pub async fn get_all(&self) -> Result<Vec<User>> {
///     self.repository.find_all().await
/// }
/// ```
#[proc_macro_attribute]
pub fn transactional(attr: TokenStream, item: TokenStream) -> TokenStream {
    transactional::transactional_attribute(attr, item)
}
