/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: access token guard / cors: ブラウザ向け CORS / http: request-id, trace, limit, timeout
 */
pub mod auth;
pub mod cors;
pub mod http;
