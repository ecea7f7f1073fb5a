//! Request assembly for every supported MetaWeblog procedure.
//!
//! Each builder validates its scalar arguments, then lays the parameters out
//! in the positional order the remote procedure expects. Nothing here talks
//! to the network, so every failure is reported before a request exists.

use crate::error::Result;
use crate::media::MediaObject;
use crate::post::{CanonicalPost, PostStruct};
use crate::utils::require_non_empty;
use crate::value::Value;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Remote procedure names.
pub mod method {
    pub const GET_POST: &str = "metaWeblog.getPost";
    pub const GET_RECENT_POSTS: &str = "metaWeblog.getRecentPosts";
    pub const NEW_POST: &str = "metaWeblog.newPost";
    pub const EDIT_POST: &str = "metaWeblog.editPost";
    pub const DELETE_POST: &str = "metaWeblog.deletePost";
    pub const GET_CATEGORIES: &str = "metaWeblog.getCategories";
    pub const NEW_MEDIA_OBJECT: &str = "metaWeblog.newMediaObject";
    pub const GET_TEMPLATE: &str = "metaWeblog.getTemplate";
    pub const SET_TEMPLATE: &str = "metaWeblog.setTemplate";
    pub const GET_USERS_BLOGS: &str = "metaWeblog.getUsersBlogs";
}

/// Number of posts fetched by `getRecentPosts` when the caller does not say.
pub const DEFAULT_RECENT_POSTS: i32 = 10;

/// One remote procedure call: name plus positional parameters.
///
/// Binary payloads are carried as [`Value::Base64`], which tells the wire
/// codec to emit a `<base64>` element instead of a `<string>`.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcCall {
    pub method: &'static str,
    pub params: Vec<Value>,
}

impl RpcCall {
    pub fn new(method: &'static str, params: Vec<Value>) -> Self {
        Self { method, params }
    }
}

/// Session values shared by every request.
#[derive(Debug, Clone, Copy)]
pub struct Credentials<'a> {
    pub blog_id: i32,
    pub username: Option<&'a str>,
    pub password: Option<&'a str>,
    pub encoding: &'a str,
}

impl Credentials<'_> {
    fn blog_id(&self) -> Value {
        Value::Int(self.blog_id)
    }

    fn user(&self) -> Value {
        Value::from(self.username)
    }

    fn pass(&self) -> Value {
        Value::from(self.password)
    }
}

/// Applies the `getRecentPosts` count policy: absent means 10, anything
/// below 1 is raised to 1.
pub fn recent_posts_count(count: Option<i32>) -> i32 {
    count.unwrap_or(DEFAULT_RECENT_POSTS).max(1)
}

/// Application keys are optional; an absent key is sent as boolean `false`.
fn app_key(appkey: Option<&str>) -> Value {
    appkey.map_or(Value::Bool(false), Value::from)
}

fn post_id(post_id: &str) -> Result<Value> {
    require_non_empty(post_id, "post id").map(Value::from)
}

pub fn get_post(creds: &Credentials<'_>, id: &str) -> Result<RpcCall> {
    let id = post_id(id)?;
    Ok(RpcCall::new(
        method::GET_POST,
        vec![id, creds.user(), creds.pass()],
    ))
}

pub fn get_recent_posts(creds: &Credentials<'_>, count: Option<i32>) -> RpcCall {
    RpcCall::new(
        method::GET_RECENT_POSTS,
        vec![
            creds.blog_id(),
            creds.user(),
            creds.pass(),
            Value::Int(recent_posts_count(count)),
        ],
    )
}

pub fn new_post(creds: &Credentials<'_>, post: &PostStruct, publish: bool) -> Result<RpcCall> {
    let post = CanonicalPost::build(post, creds.encoding)?;
    Ok(RpcCall::new(
        method::NEW_POST,
        vec![
            creds.blog_id(),
            creds.user(),
            creds.pass(),
            post.into(),
            Value::Bool(publish),
        ],
    ))
}

pub fn edit_post(
    creds: &Credentials<'_>,
    id: &str,
    post: &PostStruct,
    publish: bool,
) -> Result<RpcCall> {
    let id = post_id(id)?;
    let post = CanonicalPost::build(post, creds.encoding)?;
    Ok(RpcCall::new(
        method::EDIT_POST,
        vec![id, creds.user(), creds.pass(), post.into(), Value::Bool(publish)],
    ))
}

pub fn delete_post(
    creds: &Credentials<'_>,
    id: &str,
    appkey: Option<&str>,
    publish: bool,
) -> Result<RpcCall> {
    let id = post_id(id)?;
    Ok(RpcCall::new(
        method::DELETE_POST,
        vec![
            app_key(appkey),
            id,
            creds.user(),
            creds.pass(),
            Value::Bool(publish),
        ],
    ))
}

pub fn get_categories(creds: &Credentials<'_>) -> RpcCall {
    RpcCall::new(
        method::GET_CATEGORIES,
        vec![creds.blog_id(), creds.user(), creds.pass()],
    )
}

/// Builds `newMediaObject`. The file content is base64-encoded and tagged as
/// a binary value.
pub fn new_media_object(creds: &Credentials<'_>, media: &MediaObject) -> Result<RpcCall> {
    media.validate()?;

    let descriptor = Value::structure([
        ("name", Value::from(media.name.as_str())),
        ("type", Value::from(media.mime_type.as_str())),
        ("bits", Value::Base64(STANDARD.encode(&media.bits))),
        ("overwrite", Value::Bool(media.overwrite)),
    ]);

    Ok(RpcCall::new(
        method::NEW_MEDIA_OBJECT,
        vec![creds.blog_id(), creds.user(), creds.pass(), descriptor],
    ))
}

pub fn get_template(
    creds: &Credentials<'_>,
    template_type: &str,
    appkey: Option<&str>,
) -> Result<RpcCall> {
    let template_type = require_non_empty(template_type, "template type")?;
    Ok(RpcCall::new(
        method::GET_TEMPLATE,
        vec![
            app_key(appkey),
            creds.blog_id(),
            creds.user(),
            creds.pass(),
            Value::from(template_type),
        ],
    ))
}

/// Builds `setTemplate`. The template body is sent verbatim, not normalized:
/// it is markup and escaping it would break it.
pub fn set_template(
    creds: &Credentials<'_>,
    template: &str,
    template_type: &str,
    appkey: Option<&str>,
) -> Result<RpcCall> {
    let template_type = require_non_empty(template_type, "template type")?;
    let template = require_non_empty(template, "template")?;

    Ok(RpcCall::new(
        method::SET_TEMPLATE,
        vec![
            app_key(appkey),
            creds.blog_id(),
            creds.user(),
            creds.pass(),
            Value::from(template),
            Value::from(template_type),
        ],
    ))
}

pub fn get_users_blogs(creds: &Credentials<'_>, appkey: Option<&str>) -> RpcCall {
    RpcCall::new(
        method::GET_USERS_BLOGS,
        vec![app_key(appkey), creds.user(), creds.pass()],
    )
}
