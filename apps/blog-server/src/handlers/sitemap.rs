//! XML sitemap of published posts.

use actix_web::{HttpRequest, HttpResponse, web};
use blog_core::domain::Post;
use quick_xml::escape::escape;

use crate::middleware::error::AppResult;
use crate::state::AppState;

use super::request_origin;

const CHANGEFREQ: &str = "weekly";
const PRIORITY: &str = "0.9";

pub fn render(posts: &[Post], origin: &str) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for post in posts {
        xml.push_str(&format!(
            "  <url>\n    <loc>{}</loc>\n    <lastmod>{}</lastmod>\n    \
             <changefreq>{CHANGEFREQ}</changefreq>\n    <priority>{PRIORITY}</priority>\n  </url>\n",
            escape(post.absolute_url(origin).as_str()),
            post.updated_at.format("%Y-%m-%d"),
        ));
    }
    xml.push_str("</urlset>\n");
    xml
}

/// GET /sitemap.xml
pub async fn sitemap(req: HttpRequest, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let posts = state.blog.sitemap().await?;
    let body = render(&posts, &request_origin(&req));

    Ok(HttpResponse::Ok()
        .content_type("application/xml; charset=utf-8")
        .body(body))
}
